//! Image object discovery
//!
//! Only XObjects named directly in a page's resource set are considered;
//! images nested inside Form XObjects are not visited.

use std::collections::HashSet;

use tracing::trace;

use crate::document::{ObjectKind, ObjectRef, Page, PdfDocument};

/// Distinct image objects referenced by a page, in resource order
pub fn locate_images(doc: &PdfDocument, page: Page) -> Vec<ObjectRef> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for entry in doc.resources(page).entries() {
        let Some(target) = entry.target else {
            trace!(page = page.number, name = %entry.name, "xobject is not a reference");
            continue;
        };

        match doc.resolve(target) {
            Some(ObjectKind::Image) => {
                if seen.insert(target) {
                    images.push(target);
                }
            }
            Some(ObjectKind::Other) => {}
            None => {
                trace!(page = page.number, name = %entry.name, object = ?target, "dangling xobject reference");
            }
        }
    }

    images
}
