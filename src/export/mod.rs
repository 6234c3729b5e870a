//! Downloadable ticket artifacts.
//!
//! The HTTP layer hands a [`TicketView`] to a [`TicketExporter`] and streams
//! the returned bytes. Rendering never touches the store.

use std::fmt::{self, Write as _};

use crate::error::TicketingError;
use crate::service::TicketView;

/// A rendered ticket ready to be served as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArtifact {
    /// MIME type of `body`.
    pub content_type: &'static str,
    /// Suggested file name for `Content-Disposition`.
    pub file_name: String,
    /// Rendered bytes.
    pub body: Vec<u8>,
}

/// Renders a ticket into a downloadable document.
pub trait TicketExporter: Send + Sync + fmt::Debug {
    /// Renders `view`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Internal`] if rendering fails.
    fn export(&self, view: &TicketView) -> Result<ExportedArtifact, TicketingError>;
}

/// Plain-text ticket with the scan code printed for manual entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExporter;

impl PlainTextExporter {
    fn render(view: &TicketView, out: &mut String) -> fmt::Result {
        let ticket = &view.ticket;
        writeln!(out, "TICKET {}", ticket.ticket_number)?;
        writeln!(out, "Scan code: {}", ticket.scan_code)?;
        writeln!(out, "Status: {}", view.status)?;
        writeln!(out, "Admissions: {}", ticket.quantity)?;
        writeln!(out, "Total: {}", ticket.total_amount)?;
        writeln!(out, "Payment: {}", ticket.payment_status)?;
        writeln!(out, "Purchased: {}", ticket.purchased_at.to_rfc3339())?;
        writeln!(out)?;

        writeln!(out, "EVENT")?;
        match &view.event {
            Some(event) => {
                writeln!(out, "{}", event.title)?;
                writeln!(out, "Starts: {}", event.starts_at.to_rfc3339())?;
                if let Some(ends_at) = event.ends_at {
                    writeln!(out, "Ends: {}", ends_at.to_rfc3339())?;
                }
                writeln!(out, "Location: {}", event.location.summary())?;
            }
            None => writeln!(out, "Event {} is no longer available", ticket.event_id)?,
        }
        writeln!(out)?;

        writeln!(out, "ATTENDEES")?;
        for (n, attendee) in ticket.attendees.iter().enumerate() {
            write!(out, "{}. {} <{}>", n + 1, attendee.full_name, attendee.email)?;
            match attendee.checked_in_at {
                Some(at) => writeln!(out, " checked in {}", at.to_rfc3339())?,
                None => writeln!(out)?,
            }
        }
        Ok(())
    }
}

impl TicketExporter for PlainTextExporter {
    fn export(&self, view: &TicketView) -> Result<ExportedArtifact, TicketingError> {
        let mut out = String::new();
        Self::render(view, &mut out)
            .map_err(|e| TicketingError::Internal(format!("ticket rendering failed: {e}")))?;
        Ok(ExportedArtifact {
            content_type: "text/plain; charset=utf-8",
            file_name: format!("{}.txt", view.ticket.ticket_number),
            body: out.into_bytes(),
        })
    }
}
