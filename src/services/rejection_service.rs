//! Anti-misfire checks for rejection notices.
//!
//! A rejection may only go out when the notice actually names the candidate
//! and the job it is about. The preview produced here is what recruiters edit
//! before confirming; whatever text they submit is checked again on confirm.

use serde::{Deserialize, Serialize};

use crate::models::candidate::first_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionChecklist {
    pub candidate_name_match: bool,
    pub job_title_match: bool,
    pub email_active: bool,
}

impl RejectionChecklist {
    /// Name and job title are hard requirements; a missing email only
    /// means the notice will not be delivered.
    pub fn passed(&self) -> bool {
        self.candidate_name_match && self.job_title_match
    }
}

/// Values the preview was built from, echoed back so the recruiter can see
/// what the checklist will look for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewValidations {
    pub name: String,
    pub job: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionPreview {
    pub preview: String,
    pub validations: PreviewValidations,
}

pub fn render_notice(first_name: &str, job_title: &str, company_name: &str) -> String {
    format!(
        "Olá, {first_name}!\n\n\
         Agradecemos seu interesse na vaga de {job_title} na {company_name}.\n\n\
         Após análise cuidadosa do seu perfil, decidimos seguir com outros candidatos que possuem \
         maior aderência aos requisitos técnicos exigidos para esta posição específica no momento.\n\n\
         Seu currículo permanecerá em nosso banco de talentos para futuras oportunidades.\n\n\
         Atenciosamente,\n\
         Equipe de Recrutamento {company_name}"
    )
}

pub fn build_preview(
    candidate_full_name: &str,
    candidate_email: &str,
    job_title: &str,
    company_name: &str,
) -> RejectionPreview {
    let name = first_name(candidate_full_name);
    RejectionPreview {
        preview: render_notice(name, job_title, company_name),
        validations: PreviewValidations {
            name: name.to_string(),
            job: job_title.to_string(),
            email: candidate_email.to_string(),
        },
    }
}

pub fn check_notice(
    content: &str,
    candidate_full_name: &str,
    job_title: &str,
    candidate_email: &str,
) -> RejectionChecklist {
    let name = first_name(candidate_full_name);
    let title = job_title.trim();
    RejectionChecklist {
        candidate_name_match: !name.is_empty() && content.contains(name),
        job_title_match: !title.is_empty() && content.contains(title),
        email_active: !candidate_email.trim().is_empty(),
    }
}

pub fn notice_subject(job_title: &str, company_name: &str) -> String {
    format!("Sua candidatura para {} - {}", job_title, company_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "Maria Silva Santos";
    const JOB: &str = "Desenvolvedor Full Stack Sênior";
    const EMAIL: &str = "maria.silva@email.com";

    #[test]
    fn generated_preview_passes_its_own_checklist() {
        let preview = build_preview(NAME, EMAIL, JOB, "Talento");
        assert!(preview.preview.starts_with("Olá, Maria!"));
        assert!(preview.preview.contains("vaga de Desenvolvedor Full Stack Sênior na Talento"));
        assert_eq!(preview.validations.name, "Maria");

        let checklist = check_notice(&preview.preview, NAME, JOB, EMAIL);
        assert!(checklist.passed());
        assert!(checklist.email_active);
    }

    #[test]
    fn notice_for_another_candidate_fails() {
        let other = render_notice("João", JOB, "Talento");
        let checklist = check_notice(&other, NAME, JOB, EMAIL);
        assert!(!checklist.candidate_name_match);
        assert!(checklist.job_title_match);
        assert!(!checklist.passed());
    }

    #[test]
    fn notice_for_another_job_fails() {
        let other = render_notice("Maria", "Designer UX/UI Pleno", "Talento");
        let checklist = check_notice(&other, NAME, JOB, EMAIL);
        assert!(checklist.candidate_name_match);
        assert!(!checklist.job_title_match);
        assert!(!checklist.passed());
    }

    #[test]
    fn empty_job_title_never_matches() {
        let checklist = check_notice("Olá, Maria!", NAME, "  ", "");
        assert!(!checklist.job_title_match);
        assert!(!checklist.email_active);
    }
}
