//! Letterhead template shared by the HTML preview and the PDF.

use chrono::{DateTime, Local};
use faultline_core::DriverLetterReport;

use crate::markup::{escape_html, format_letter_body};

/// Organisation block printed at the top and in the footer of every letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letterhead {
    pub organization: String,
    pub address: String,
    pub contact: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            organization: "LifeAmore".to_string(),
            address: "256 Government Ave, Capital City, 11221".to_string(),
            contact: "Phone: (555) 123-4567 | Email: info@lifeamore.gov".to_string(),
        }
    }
}

impl Letterhead {
    /// Signature line under "Sincerely,".
    pub fn signature(&self) -> String {
        format!("{} Department of Public Safety", self.organization)
    }

    pub fn footer(&self) -> String {
        format!(
            "Official Document \u{2014} {} \u{2014} {} \u{2014} {}",
            self.organization, self.address, self.contact
        )
    }
}

/// Date line for a report: its timestamp as a local `M/D/YYYY` date, or
/// today when the timestamp is missing or unparsable.
pub fn letter_date(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(ts) => ts.with_timezone(&Local).format("%-m/%-d/%Y").to_string(),
        Err(_) => Local::now().format("%-m/%-d/%Y").to_string(),
    }
}

pub fn subject_line(report: &DriverLetterReport) -> String {
    format!(
        "Police Report - Case {}",
        report.case_number.as_deref().unwrap_or_default()
    )
}

/// Complete letter as a self-contained HTML fragment.
pub fn letter_html(report: &DriverLetterReport, letterhead: &Letterhead) -> String {
    let org = escape_html(&letterhead.organization);
    let address = escape_html(&letterhead.address);
    let contact = escape_html(&letterhead.contact);
    let date = letter_date(&report.timestamp);
    let recipient = escape_html(&report.title);
    let subject = escape_html(&subject_line(report));
    let body = format_letter_body(&report.content);
    let signature = escape_html(&letterhead.signature());
    let footer = escape_html(&letterhead.footer());

    format!(
        r#"<div style="padding: 8px; font-family: 'Times New Roman', Times, serif; color: #222; max-width: 900px; width: 100%; box-sizing: border-box; word-break: break-word; min-height: 1000px; display: flex; flex-direction: column; justify-content: space-between;">
  <div>
    <div style="display: flex; flex-direction: column; align-items: flex-start; margin-bottom: 8px;">
      <div style="font-size: 1.2rem; font-weight: bold; color: #0a2463;">{org}</div>
      <div style="font-size: 0.85rem; color: #444;">{address}</div>
      <div style="font-size: 0.85rem; color: #444;">{contact}</div>
    </div>
    <hr style="border: 1px solid #0a2463; margin: 10px 0 14px 0;" />
    <div style="font-size: 0.95rem; margin-bottom: 4px;"><strong>Date:</strong> {date}</div>
    <div style="font-size: 0.95rem; margin-bottom: 4px;"><strong>To:</strong> {recipient}</div>
    <div style="font-size: 0.95rem; margin-bottom: 10px;"><strong>Subject:</strong> {subject}</div>
    <div style="font-size: 1rem; line-height: 1.5; margin-bottom: 18px;">{body}</div>
    <div style="margin-top: 24px; font-size: 0.95rem;">
      <div>Sincerely,</div>
      <div style="margin-top: 18px; font-weight: bold;">{signature}</div>
    </div>
  </div>
  <div style="margin-top: auto;">
    <hr style="border: 0.5px solid #bbb; margin: 24px 0 6px 0;" />
    <div style="font-size: 0.75rem; color: #666;">{footer}</div>
  </div>
</div>"#
    )
}

/// Standalone page for the browser print dialog.
pub fn print_page(title: &str, letter_html: &str) -> String {
    let title = escape_html(title);
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>{title}</title>
    <style>
      body {{ font-family: Arial, sans-serif; margin: 40px; }}
      p {{ font-size: 14px; margin-bottom: 15px; line-height: 1.5; }}
    </style>
  </head>
  <body>
    {letter_html}
  </body>
</html>
"#
    )
}
