//! hri show - Show one candidate

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::{HriError, Result};
use crate::model::Candidate;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Candidate id
    pub id: String,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    let candidate = ctx
        .db
        .get_by_id(&args.id)?
        .ok_or_else(|| HriError::NotFound(format!("candidate {}", args.id)))?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(&candidate));
    }
    emit_human(layout(&candidate));
    Ok(())
}

fn layout(candidate: &Candidate) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title(&candidate.name).kv("id", &candidate.id);

    if let Some(contact) = &candidate.contact_info {
        for (key, value) in [
            ("email", &contact.email),
            ("phone", &contact.phone),
            ("address", &contact.address),
            ("linkedin", &contact.linkedin),
            ("website", &contact.website),
        ] {
            if let Some(value) = value {
                layout.kv(key, value);
            }
        }
    }
    if let Some(summary) = &candidate.summary {
        layout.blank().push_line(summary.clone());
    }

    if !candidate.work_experience.is_empty() {
        layout.blank().section("Experience");
        for job in &candidate.work_experience {
            let dates = job.dates.as_deref().unwrap_or("dates unknown");
            layout.bullet(&format!("{} at {} ({dates})", job.role, job.company));
            for line in &job.responsibilities {
                layout.push_line(format!("    {line}"));
            }
        }
    }

    if !candidate.education.is_empty() {
        layout.blank().section("Education");
        for entry in &candidate.education {
            let mut line = format!("{}, {}", entry.degree, entry.institution);
            if let Some(field) = &entry.field_of_study {
                line.push_str(&format!(" ({field})"));
            }
            if let Some(dates) = &entry.dates {
                line.push_str(&format!(" {dates}"));
            }
            layout.bullet(&line);
        }
    }

    if !candidate.skills.is_empty() {
        layout.blank().section("Skills").push_line(candidate.skills.join(", "));
    }
    if !candidate.certifications.is_empty() {
        layout
            .blank()
            .section("Certifications")
            .push_line(candidate.certifications.join(", "));
    }
    layout
}
