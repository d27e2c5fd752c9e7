//! Eye prescription records and the form editor that manipulates them.
//!
//! A record has a fixed shape: for each eye, a distance and a near reading
//! (`sph`, `cyl`, `axis`, `vision`, `add`) plus three fitting measurements
//! (`psm`, `pd`, `fh`). That makes 26 leaf values, all kept as opaque text
//! exactly as the optometrist wrote them. On the wire the record is flat
//! (`left_d_sph`, ..., `right_fh`) and every key is always present.

use core::fmt;
use core::str::FromStr;

use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::types::text::value_to_text;
use crate::types::{CustomerId, PrescriptionType};

/// Which eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Distance or near vision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisionMode {
    Distance,
    Near,
}

impl VisionMode {
    pub const ALL: [Self; 2] = [Self::Distance, Self::Near];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "d",
            Self::Near => "n",
        }
    }
}

/// One value of an optical reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingValue {
    Sph,
    Cyl,
    Axis,
    Vision,
    Add,
}

impl ReadingValue {
    pub const ALL: [Self; 5] = [Self::Sph, Self::Cyl, Self::Axis, Self::Vision, Self::Add];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sph => "sph",
            Self::Cyl => "cyl",
            Self::Axis => "axis",
            Self::Vision => "vision",
            Self::Add => "add",
        }
    }
}

/// One fitting measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FittingValue {
    Psm,
    Pd,
    Fh,
}

impl FittingValue {
    pub const ALL: [Self; 3] = [Self::Psm, Self::Pd, Self::Fh];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Psm => "psm",
            Self::Pd => "pd",
            Self::Fh => "fh",
        }
    }
}

/// Address of one of the 26 leaf fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrescriptionField {
    Reading {
        side: Side,
        mode: VisionMode,
        value: ReadingValue,
    },
    Fitting {
        side: Side,
        value: FittingValue,
    },
}

/// Number of leaf fields in a record.
pub const FIELD_COUNT: usize = 26;

impl PrescriptionField {
    /// Every field, in form order: left readings, right readings, then fittings.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let readings = Side::ALL.into_iter().flat_map(|side| {
            VisionMode::ALL.into_iter().flat_map(move |mode| {
                ReadingValue::ALL
                    .into_iter()
                    .map(move |value| Self::Reading { side, mode, value })
            })
        });
        let fittings = Side::ALL.into_iter().flat_map(|side| {
            FittingValue::ALL
                .into_iter()
                .map(move |value| Self::Fitting { side, value })
        });
        readings.chain(fittings).collect()
    }

    /// Flat wire key, e.g. `left_d_sph` or `right_pd`.
    #[must_use]
    pub fn key(self) -> String {
        match self {
            Self::Reading { side, mode, value } => {
                format!("{}_{}_{}", side.as_str(), mode.as_str(), value.as_str())
            }
            Self::Fitting { side, value } => format!("{}_{}", side.as_str(), value.as_str()),
        }
    }
}

impl fmt::Display for PrescriptionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for PrescriptionField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| format!("unknown prescription field: {s}"))
    }
}

/// Refraction values for one eye at one distance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpticalReading {
    pub sph: String,
    pub cyl: String,
    pub axis: String,
    pub vision: String,
    pub add: String,
}

impl OpticalReading {
    fn slot(&mut self, value: ReadingValue) -> &mut String {
        match value {
            ReadingValue::Sph => &mut self.sph,
            ReadingValue::Cyl => &mut self.cyl,
            ReadingValue::Axis => &mut self.axis,
            ReadingValue::Vision => &mut self.vision,
            ReadingValue::Add => &mut self.add,
        }
    }

    const fn get(&self, value: ReadingValue) -> &String {
        match value {
            ReadingValue::Sph => &self.sph,
            ReadingValue::Cyl => &self.cyl,
            ReadingValue::Axis => &self.axis,
            ReadingValue::Vision => &self.vision,
            ReadingValue::Add => &self.add,
        }
    }
}

/// Frame fitting measurements for one eye.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FittingMeasurements {
    pub psm: String,
    pub pd: String,
    pub fh: String,
}

/// Everything recorded for one eye.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EyePrescription {
    pub distance: OpticalReading,
    pub near: OpticalReading,
    pub fitting: FittingMeasurements,
}

impl EyePrescription {
    const fn reading(&self, mode: VisionMode) -> &OpticalReading {
        match mode {
            VisionMode::Distance => &self.distance,
            VisionMode::Near => &self.near,
        }
    }

    fn reading_mut(&mut self, mode: VisionMode) -> &mut OpticalReading {
        match mode {
            VisionMode::Distance => &mut self.distance,
            VisionMode::Near => &mut self.near,
        }
    }
}

/// A complete prescription as exchanged with the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrescriptionRecord {
    /// Prescription number. Free text, may be empty.
    pub id: String,
    pub customer_id: Option<CustomerId>,
    pub kind: PrescriptionType,
    pub date: String,
    pub doctor: String,
    pub left: EyePrescription,
    pub right: EyePrescription,
}

impl PrescriptionRecord {
    /// Blank record for a customer.
    #[must_use]
    pub fn for_customer(customer_id: Option<CustomerId>) -> Self {
        Self {
            customer_id,
            ..Self::default()
        }
    }

    const fn eye(&self, side: Side) -> &EyePrescription {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn eye_mut(&mut self, side: Side) -> &mut EyePrescription {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Read a leaf field.
    #[must_use]
    pub fn get(&self, field: PrescriptionField) -> &str {
        match field {
            PrescriptionField::Reading { side, mode, value } => {
                self.eye(side).reading(mode).get(value)
            }
            PrescriptionField::Fitting { side, value } => {
                let fitting = &self.eye(side).fitting;
                match value {
                    FittingValue::Psm => &fitting.psm,
                    FittingValue::Pd => &fitting.pd,
                    FittingValue::Fh => &fitting.fh,
                }
            }
        }
    }

    fn slot(&mut self, field: PrescriptionField) -> &mut String {
        match field {
            PrescriptionField::Reading { side, mode, value } => {
                self.eye_mut(side).reading_mut(mode).slot(value)
            }
            PrescriptionField::Fitting { side, value } => {
                let fitting = &mut self.eye_mut(side).fitting;
                match value {
                    FittingValue::Psm => &mut fitting.psm,
                    FittingValue::Pd => &mut fitting.pd,
                    FittingValue::Fh => &mut fitting.fh,
                }
            }
        }
    }

    /// Overwrite a leaf field.
    pub fn set(&mut self, field: PrescriptionField, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }
}

impl Serialize for PrescriptionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT + 5))?;
        map.serialize_entry("customer_id", &self.customer_id)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", &self.kind)?;
        map.serialize_entry("date", &self.date)?;
        map.serialize_entry("doctor", &self.doctor)?;
        for field in PrescriptionField::all() {
            map.serialize_entry(&field.key(), self.get(field))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PrescriptionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let text = |key: &str| map.get(key).map(value_to_text).unwrap_or_default();

        let customer_id = match map.get("customer_id") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let raw = value_to_text(value);
                let raw = raw.trim();
                if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse::<CustomerId>().map_err(D::Error::custom)?)
                }
            }
        };
        let kind = text("type").parse().unwrap_or_default();

        let mut record = Self {
            id: text("id"),
            customer_id,
            kind,
            date: text("date"),
            doctor: text("doctor"),
            ..Self::default()
        };
        for field in PrescriptionField::all() {
            record.set(field, text(&field.key()));
        }
        Ok(record)
    }
}

/// How the editor was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit,
    ReadOnly,
}

/// What submitting the form should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// Send this record to the backend.
    Save(PrescriptionRecord),
    /// Read-only view: just close.
    Close,
}

/// In-memory prescription form.
#[derive(Debug, Clone)]
pub struct PrescriptionEditor {
    mode: EditorMode,
    record: PrescriptionRecord,
}

impl PrescriptionEditor {
    /// Blank form for a new prescription.
    #[must_use]
    pub fn new_create(customer_id: Option<CustomerId>) -> Self {
        Self {
            mode: EditorMode::Create,
            record: PrescriptionRecord::for_customer(customer_id),
        }
    }

    /// Open an existing record for editing.
    #[must_use]
    pub fn open_edit(record: &PrescriptionRecord) -> Self {
        Self {
            mode: EditorMode::Edit,
            record: record.clone(),
        }
    }

    /// Open an existing record read-only.
    #[must_use]
    pub fn open_read_only(record: &PrescriptionRecord) -> Self {
        Self {
            mode: EditorMode::ReadOnly,
            record: record.clone(),
        }
    }

    /// Re-open this editor on another record.
    ///
    /// Every field is replaced, including ones left blank in `record`, so no
    /// value from a previously shown prescription survives.
    pub fn reopen(&mut self, mode: EditorMode, record: &PrescriptionRecord) {
        self.mode = mode;
        self.record = record.clone();
    }

    #[must_use]
    pub const fn mode(&self) -> EditorMode {
        self.mode
    }

    #[must_use]
    pub const fn record(&self) -> &PrescriptionRecord {
        &self.record
    }

    fn writable(&mut self) -> ValidationResult<&mut PrescriptionRecord> {
        if self.mode == EditorMode::ReadOnly {
            return Err(ValidationError::ReadOnly);
        }
        Ok(&mut self.record)
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::ReadOnly`] in read-only mode.
    pub fn set_field(
        &mut self,
        field: PrescriptionField,
        value: impl Into<String>,
    ) -> ValidationResult<()> {
        self.writable()?.set(field, value);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::ReadOnly`] in read-only mode.
    pub fn set_id(&mut self, id: impl Into<String>) -> ValidationResult<()> {
        self.writable()?.id = id.into();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::ReadOnly`] in read-only mode.
    pub fn set_type(&mut self, kind: PrescriptionType) -> ValidationResult<()> {
        self.writable()?.kind = kind;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::ReadOnly`] in read-only mode.
    pub fn set_date(&mut self, date: impl Into<String>) -> ValidationResult<()> {
        self.writable()?.date = date.into();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::ReadOnly`] in read-only mode.
    pub fn set_doctor(&mut self, doctor: impl Into<String>) -> ValidationResult<()> {
        self.writable()?.doctor = doctor.into();
        Ok(())
    }

    /// Decide what submitting the form does.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CustomerRequired`] when saving without a
    /// customer.
    pub fn prepare_submit(&self) -> ValidationResult<SubmitAction> {
        if self.mode == EditorMode::ReadOnly {
            return Ok(SubmitAction::Close);
        }
        if self.record.customer_id.is_none() {
            return Err(ValidationError::CustomerRequired);
        }
        Ok(SubmitAction::Save(self.record.clone()))
    }
}
