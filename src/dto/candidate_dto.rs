use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::Application;
use crate::models::candidate::Candidate;

/// Text fields of the public intake form, after multipart decoding.
#[derive(Debug, Clone, Default, Validate)]
pub struct IntakeForm {
    #[validate(length(min = 1, message = "full_name is required"))]
    pub full_name: String,
    pub cpf: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 8, message = "phone is required"))]
    pub phone: String,
    pub cep: Option<String>,
    pub street: Option<String>,
    pub address_number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 2))]
    pub state: Option<String>,
    pub country: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(url)]
    pub portfolio_url: Option<String>,
    pub job_id: Option<String>,
    pub lgpd_consent: bool,
    pub confirm_email: Option<String>,
    pub confirm_phone: Option<String>,
}

impl IntakeForm {
    /// Sets a named multipart text field. Blank values count as absent.
    pub fn set_field(&mut self, name: &str, value: String) {
        let value = value.trim().to_string();
        let optional = if value.is_empty() { None } else { Some(value.clone()) };
        match name {
            "full_name" => self.full_name = value,
            "cpf" => self.cpf = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "cep" => self.cep = optional,
            "street" => self.street = optional,
            "address_number" => self.address_number = optional,
            "complement" => self.complement = optional,
            "neighborhood" => self.neighborhood = optional,
            "city" => self.city = optional,
            "state" => self.state = optional.map(|s| s.to_uppercase()),
            "country" => self.country = optional,
            "linkedin_url" => self.linkedin_url = optional,
            "portfolio_url" => self.portfolio_url = optional,
            "job_id" => self.job_id = optional,
            "lgpd_consent" => {
                self.lgpd_consent = matches!(value.to_lowercase().as_str(), "true" | "1" | "on" | "yes")
            }
            "confirm_email" => self.confirm_email = optional,
            "confirm_phone" => self.confirm_phone = optional,
            _ => {}
        }
    }

    pub fn requested_job_id(&self) -> Option<Uuid> {
        self.job_id.as_deref().and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCandidatePayload {
    #[validate(length(min = 1))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8))]
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub cep: Option<String>,
    pub street: Option<String>,
    pub address_number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 2))]
    pub state: Option<String>,
    pub country: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(url)]
    pub portfolio_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpfCheckQuery {
    pub cpf: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpfCheckResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntakeResponse {
    pub candidate: Candidate,
    pub application: Application,
    pub created: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNotePayload {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub application_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> IntakeForm {
        let mut form = IntakeForm::default();
        form.set_field("full_name", "Ana Carolina Ferreira".into());
        form.set_field("cpf", "111.444.777-35".into());
        form.set_field("email", "ana.ferreira@email.com".into());
        form.set_field("phone", "(31) 97654-3210".into());
        form.set_field("state", "mg".into());
        form.set_field("linkedin_url", "https://linkedin.com/in/anaferreira".into());
        form.set_field("portfolio_url", "   ".into());
        form.set_field("lgpd_consent", "true".into());
        form
    }

    #[test]
    fn multipart_fields_are_trimmed_and_normalized() {
        let form = filled_form();
        assert_eq!(form.state.as_deref(), Some("MG"));
        assert!(form.portfolio_url.is_none());
        assert!(form.lgpd_consent);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn invalid_email_and_url_fail_validation() {
        let mut form = filled_form();
        form.set_field("email", "not-an-email".into());
        assert!(form.validate().is_err());

        let mut form = filled_form();
        form.set_field("linkedin_url", "linkedin".into());
        assert!(form.validate().is_err());
    }

    #[test]
    fn malformed_job_id_is_ignored() {
        let mut form = filled_form();
        form.set_field("job_id", "default-job-id".into());
        assert!(form.requested_job_id().is_none());
        form.set_field("job_id", "00000000-0000-0000-0000-000000000001".into());
        assert_eq!(form.requested_job_id(), Some(Uuid::from_u128(1)));
    }
}
