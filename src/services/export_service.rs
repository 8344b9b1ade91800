use crate::dto::application_dto::ApplicationView;
use crate::error::{Error, Result};
use crate::models::application::Stage;
use rust_xlsxwriter::*;

const HEADERS: [&str; 10] = [
    "Candidato",
    "Email",
    "Telefone",
    "Cidade",
    "UF",
    "Vaga",
    "Departamento",
    "Etapa",
    "Inscrição",
    "Última mudança",
];

fn row_values(view: &ApplicationView) -> [String; 10] {
    [
        view.candidate.full_name.clone(),
        view.candidate.email.clone(),
        view.candidate.phone.clone(),
        view.candidate.city.clone().unwrap_or_default(),
        view.candidate.state.clone().unwrap_or_default(),
        view.job.title.clone(),
        view.job.department.clone(),
        view.stage_label.to_string(),
        view.application.applied_at.format("%d/%m/%Y %H:%M").to_string(),
        view.application.last_stage_change.format("%d/%m/%Y %H:%M").to_string(),
    ]
}

pub struct ExportService;

impl ExportService {
    pub fn applications_csv(applications: &[ApplicationView]) -> Result<Vec<u8>> {
        let mut csv_writer = csv::Writer::from_writer(vec![]);
        csv_writer.write_record(HEADERS)?;
        for view in applications {
            csv_writer.write_record(row_values(view))?;
        }
        csv_writer
            .into_inner()
            .map_err(|e| Error::Internal(format!("CSV flush failed: {}", e)))
    }

    /// Styled workbook with one row per application and a stage summary.
    pub fn applications_xlsx(applications: &[ApplicationView]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Candidaturas")?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let widths = [30.0, 30.0, 18.0, 20.0, 6.0, 35.0, 18.0, 20.0, 18.0, 18.0];
        for (i, width) in widths.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }
        let last_col = (HEADERS.len() - 1) as u16;

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, "Relatório de candidaturas", &title_format)?;

        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 22)?;
        let subtitle = format!(
            "Exportado em {}  •  Total: {}",
            chrono::Utc::now().format("%d/%m/%Y %H:%M UTC"),
            applications.len()
        );
        worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, name) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 3;
        for (idx, view) in applications.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };
            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let stage_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(stage_color(view.application.current_stage))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);

            worksheet.set_row_height(row, 22)?;
            for (col, value) in row_values(view).iter().enumerate() {
                let fmt = if col == 7 { &stage_fmt } else { &base_fmt };
                worksheet.write_string_with_format(row, col as u16, value, fmt)?;
            }
        }

        let summary_row = data_start_row + applications.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let by_stage = Stage::PIPELINE
            .iter()
            .map(|stage| {
                let count = applications
                    .iter()
                    .filter(|a| a.application.current_stage == *stage)
                    .count();
                format!("{}: {}", stage.label(), count)
            })
            .collect::<Vec<_>>()
            .join(" | ");
        worksheet.set_row_height(summary_row, 26)?;
        worksheet.merge_range(summary_row, 0, summary_row, last_col, &by_stage, &summary_fmt)?;

        worksheet.set_freeze_panes(3, 0)?;
        worksheet.autofilter(
            2,
            0,
            (data_start_row + applications.len() as u32).saturating_sub(1).max(2),
            last_col,
        )?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

fn stage_color(stage: Stage) -> Color {
    match stage {
        Stage::Applied => Color::RGB(0x3B82F6),
        Stage::Screening => Color::RGB(0x06B6D4),
        Stage::HrInterview | Stage::TechnicalInterview => Color::RGB(0x8B5CF6),
        Stage::ProposalSent => Color::RGB(0xF59E0B),
        Stage::Hired => Color::RGB(0x10B981),
        Stage::Rejected => Color::RGB(0xEF4444),
        Stage::TalentPool => Color::RGB(0x64748B),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::application_dto::{CandidateSummary, JobSummary};
    use crate::models::application::Application;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn view(name: &str, stage: Stage) -> ApplicationView {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        let application = Application {
            id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            current_stage: stage,
            previous_stage: None,
            last_stage_change: at,
            applied_at: at,
            recruiter_notes: None,
            rejection_reason: None,
            created_at: at,
            updated_at: at,
        };
        ApplicationView {
            stage_label: stage.label(),
            candidate: CandidateSummary {
                id: application.candidate_id,
                full_name: name.to_string(),
                email: "ana@email.com".into(),
                phone: "(31) 97654-3210".into(),
                city: Some("Belo Horizonte".into()),
                state: Some("MG".into()),
                has_resume: true,
            },
            job: JobSummary {
                id: application.job_id,
                title: "Analista de Dados, Pleno".into(),
                department: "BI".into(),
                company_name: "Talento".into(),
            },
            application,
        }
    }

    #[test]
    fn csv_has_header_and_quoted_rows() {
        let bytes = ExportService::applications_csv(&[view("Ana Ferreira", Stage::HrInterview)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Candidato,Email,Telefone"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Ana Ferreira,ana@email.com"));
        assert!(row.contains("\"Analista de Dados, Pleno\""));
        assert!(row.contains("Entrevista RH"));
        assert!(row.contains("02/03/2026 09:30"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = ExportService::applications_xlsx(&[
            view("Ana Ferreira", Stage::Applied),
            view("Bruno Lima", Stage::Hired),
        ])
        .unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));

        let empty = ExportService::applications_xlsx(&[]).unwrap();
        assert!(!empty.is_empty());
    }
}
