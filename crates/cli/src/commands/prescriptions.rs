//! Prescription commands.
//!
//! Leaf values are given as `FIELD=VALUE` pairs, where `FIELD` is one of the
//! 26 form keys such as `right_d_sph`, `left_n_add` or `left_pd`. Values are
//! stored as typed.

use clap::{Args, Subcommand};
use optic_desk_admin::AppError;
use optic_desk_admin::services::{PrescriptionSaveOutcome, PrescriptionService};
use optic_desk_core::{
    CustomerId, PrescriptionEditor, PrescriptionField, PrescriptionType, ValidationResult,
};

use super::{Context, emit, emit_json};

/// Prescription form fields shared by every command that fills one in.
#[derive(Args, Debug, Default)]
pub struct PrescriptionArgs {
    /// Prescription number
    #[arg(long = "rx-id")]
    pub id: Option<String>,

    /// Specs or Contacts
    #[arg(long = "rx-type")]
    pub kind: Option<PrescriptionType>,

    /// Date written on the prescription
    #[arg(id = "rx_date", long = "rx-date")]
    pub date: Option<String>,

    #[arg(long = "rx-doctor")]
    pub doctor: Option<String>,

    /// Leaf value as FIELD=VALUE, e.g. `right_d_sph=-1.25`
    #[arg(long = "rx", value_parser = parse_assignment)]
    pub values: Vec<(PrescriptionField, String)>,
}

impl PrescriptionArgs {
    /// True when nothing was filled in.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.kind.is_none()
            && self.date.is_none()
            && self.doctor.is_none()
            && self.values.is_empty()
    }

    /// Fill a writable editor.
    pub fn apply(self, editor: &mut PrescriptionEditor) -> ValidationResult<()> {
        if let Some(id) = self.id {
            editor.set_id(id)?;
        }
        if let Some(kind) = self.kind {
            editor.set_type(kind)?;
        }
        if let Some(date) = self.date {
            editor.set_date(date)?;
        }
        if let Some(doctor) = self.doctor {
            editor.set_doctor(doctor)?;
        }
        for (field, value) in self.values {
            editor.set_field(field, value)?;
        }
        Ok(())
    }
}

/// Parse `FIELD=VALUE`.
pub fn parse_assignment(raw: &str) -> Result<(PrescriptionField, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = key.trim().parse::<PrescriptionField>()?;
    Ok((field, value.trim().to_owned()))
}

#[derive(Subcommand)]
pub enum PrescriptionAction {
    /// List a customer's prescriptions
    List {
        #[arg(short, long)]
        customer: CustomerId,
    },
    /// Save a new prescription
    Add {
        #[arg(short, long)]
        customer: CustomerId,

        #[command(flatten)]
        form: PrescriptionArgs,
    },
}

pub async fn run(ctx: &Context, action: PrescriptionAction) -> Result<(), AppError> {
    let service = PrescriptionService::new(ctx.client.clone());
    match action {
        PrescriptionAction::List { customer } => {
            let records = service.list(customer).await?;
            if records.is_empty() {
                emit(format!("No prescriptions for customer {customer}"));
            } else {
                emit_json(&records);
            }
            Ok(())
        }
        PrescriptionAction::Add { customer, form } => {
            let mut editor = PrescriptionEditor::new_create(Some(customer));
            form.apply(&mut editor)?;
            report_outcome(service.submit(&editor).await?);
            Ok(())
        }
    }
}

/// Print what happened to a prescription save.
///
/// A record kept only locally is still a success: it is printed so it can be
/// re-entered, and the backend error is logged at warn.
pub fn report_outcome(outcome: PrescriptionSaveOutcome) {
    if let Some(line) = outcome_line(&outcome) {
        emit(line);
    }
    if let PrescriptionSaveOutcome::SavedLocally { record, error } = &outcome {
        tracing::warn!(error = %error, prescription = %record.id, "Prescription kept locally");
        emit_json(record);
    }
}

fn outcome_line(outcome: &PrescriptionSaveOutcome) -> Option<String> {
    match outcome {
        PrescriptionSaveOutcome::Saved(created) => Some(match created.id {
            Some(id) => format!("Saved prescription {id}"),
            None => "Saved prescription".to_string(),
        }),
        PrescriptionSaveOutcome::SavedLocally { error, .. } => Some(format!(
            "Prescription saved (local); backend unavailable: {error}"
        )),
        PrescriptionSaveOutcome::Closed => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use optic_desk_admin::ApiError;
    use optic_desk_admin::api::CreatedRecord;
    use optic_desk_core::{EditorMode, ValidationError};

    use super::*;

    #[test]
    fn test_parse_assignment() {
        let (field, value) = parse_assignment("LEFT_N_ADD = +2.00").unwrap();
        assert_eq!(field.key(), "left_n_add");
        assert_eq!(value, "+2.00");

        let (_, value) = parse_assignment("right_pd=").unwrap();
        assert_eq!(value, "");

        assert!(parse_assignment("right_pd").is_err());
        assert!(parse_assignment("middle_d_sph=1").is_err());
    }

    #[test]
    fn test_args_fill_editor() {
        let args = PrescriptionArgs {
            id: Some("RX-9".to_string()),
            kind: Some(PrescriptionType::Contacts),
            doctor: Some("Dr. Iyer".to_string()),
            values: vec![parse_assignment("right_d_axis=90").unwrap()],
            ..PrescriptionArgs::default()
        };
        assert!(!args.is_empty());

        let mut editor = PrescriptionEditor::new_create(Some(CustomerId::new(2)));
        args.apply(&mut editor).unwrap();
        let record = editor.record();
        assert_eq!(record.id, "RX-9");
        assert_eq!(record.kind, PrescriptionType::Contacts);
        assert_eq!(record.get("right_d_axis".parse().unwrap()), "90");
        assert_eq!(editor.mode(), EditorMode::Create);
    }

    #[test]
    fn test_local_save_is_reported_as_saved() {
        let outcome = PrescriptionSaveOutcome::SavedLocally {
            record: optic_desk_core::PrescriptionRecord::default(),
            error: ApiError::Status {
                status: 503,
                status_text: "Service Unavailable".to_string(),
            },
        };
        assert_eq!(
            outcome_line(&outcome).unwrap(),
            "Prescription saved (local); backend unavailable: API Error: 503 Service Unavailable"
        );
        report_outcome(outcome);

        let saved = PrescriptionSaveOutcome::Saved(CreatedRecord {
            id: Some(12),
            message: None,
        });
        assert_eq!(outcome_line(&saved).unwrap(), "Saved prescription 12");
        assert!(outcome_line(&PrescriptionSaveOutcome::Closed).is_none());
    }

    #[test]
    fn test_args_refused_by_read_only_editor() {
        let record = optic_desk_core::PrescriptionRecord::default();
        let mut editor = PrescriptionEditor::open_read_only(&record);
        let args = PrescriptionArgs {
            doctor: Some("Dr. Iyer".to_string()),
            ..PrescriptionArgs::default()
        };
        assert_eq!(args.apply(&mut editor), Err(ValidationError::ReadOnly));
        assert!(PrescriptionArgs::default().is_empty());
    }
}
