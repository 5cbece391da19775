//! Data for a participant's printable credential.
//!
//! Rendering the card image (logos, QR raster) belongs to whatever front end
//! prints it. This module only assembles what goes on the card.

use serde::Serialize;

use crate::config::WorkshopConfig;
use crate::model::Participant;

/// Everything printed on a participant's credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialPayload {
    /// Participant id, printed under the name.
    pub id: String,
    /// Participant name.
    pub name: String,
    /// Workshop title line.
    pub workshop: String,
    /// Venue line.
    pub venue: String,
    /// Date line.
    pub dates: String,
    /// Text encoded in the scannable code. Always the bare id.
    pub qr_text: String,
    /// Suggested image file name.
    pub file_name: String,
}

impl CredentialPayload {
    /// Assemble the credential for `participant`.
    #[must_use]
    pub fn new(participant: &Participant, workshop: &WorkshopConfig) -> Self {
        Self {
            id: participant.id.clone(),
            name: participant.name.clone(),
            workshop: workshop.name.clone(),
            venue: workshop.venue.clone(),
            dates: workshop.dates.clone(),
            qr_text: participant.id.clone(),
            file_name: format!("BINDS_ID_{}.png", participant.id),
        }
    }
}
