//! Drag-and-drop intake.
//!
//! Mirrors the browser drop target: every drag event has its default
//! navigation suppressed, enter/over light the zone up, leave/drop turn it
//! off, and a drop hands over only its first file. No MIME filtering happens
//! here; a dropped text file is analysed like any image.

use crate::domain::UploadedImage;

use serde::Deserialize;

/// One file carried by a drop event. `data` is the reference the client
/// read the file into (typically a data URL).
#[derive(Debug, Clone, Deserialize)]
pub struct DroppedFile {
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

impl From<DroppedFile> for UploadedImage {
    fn from(f: DroppedFile) -> Self {
        UploadedImage::new(f.name, f.mime_type, f.data.into_bytes())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum DragEvent {
    #[serde(rename = "dragenter")]
    Enter,
    #[serde(rename = "dragover")]
    Over,
    #[serde(rename = "dragleave")]
    Leave,
    #[serde(rename = "drop")]
    Drop {
        #[serde(default)]
        files: Vec<DroppedFile>,
    },
}

#[derive(Debug, Clone)]
pub struct DragOutcome {
    /// always true: the host never lets a drag navigate away
    pub default_prevented: bool,
    pub drag_active: bool,
    pub accepted: Option<UploadedImage>,
}

#[derive(Debug, Default)]
pub struct DropZone {
    active: bool,
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle(&mut self, event: DragEvent) -> DragOutcome {
        let accepted = match event {
            DragEvent::Enter | DragEvent::Over => {
                self.active = true;
                None
            }
            DragEvent::Leave => {
                self.active = false;
                None
            }
            DragEvent::Drop { files } => {
                self.active = false;
                files.into_iter().next().map(UploadedImage::from)
            }
        };

        DragOutcome { default_prevented: true, drag_active: self.active, accepted }
    }
}
