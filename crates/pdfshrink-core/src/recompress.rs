//! Page-by-page image recompression
//!
//! Pages are processed strictly in order. After every page the engine
//! reports progress, hands control back to the host scheduler, and then
//! checks for cancellation. Per-image failures are logged and counted but
//! never abort the run.

use std::future::Future;

use tracing::{debug, warn};

use crate::codec::ImageCodec;
use crate::document::{EncodedImage, ObjectRef, PdfDocument};
use crate::error::{ImageError, ShrinkError};
use crate::locate::locate_images;
use crate::options::{CompressOptions, ReplacePolicy};
use crate::progress::{CancelToken, PageProgress, ProgressState};

/// A point where the engine gives control back to its host
pub trait YieldPoint {
    fn yield_now(&mut self) -> impl Future<Output = ()>;
}

/// Never suspends; for hosts with nothing else to run
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

impl YieldPoint for NoYield {
    fn yield_now(&mut self) -> impl Future<Output = ()> {
        std::future::ready(())
    }
}

/// Adapts any `FnMut() -> Future`, e.g. `YieldFn(tokio::task::yield_now)`
pub struct YieldFn<F>(pub F);

impl<F, Fut> YieldPoint for YieldFn<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    fn yield_now(&mut self) -> impl Future<Output = ()> {
        (self.0)()
    }
}

enum ImageOutcome {
    Replaced { before: usize, after: usize },
    Kept { before: usize, after: usize },
}

/// Recompress every located image of every page, mutating `doc` in place
pub async fn recompress<C, Y, F>(
    doc: &mut PdfDocument,
    codec: &C,
    options: &CompressOptions,
    yielder: &mut Y,
    cancel: &CancelToken,
    mut on_page_done: F,
) -> Result<ProgressState, ShrinkError>
where
    C: ImageCodec + ?Sized,
    Y: YieldPoint,
    F: FnMut(PageProgress),
{
    let pages = doc.pages();
    let mut progress = ProgressState::start(pages.len() as u32);

    for page in pages {
        let images = locate_images(doc, page);
        progress.images_found += images.len() as u32;

        for image in images {
            match recompress_image(doc, codec, options, image) {
                Ok(ImageOutcome::Replaced { before, after }) => {
                    debug!(page = page.number, object = ?image, before, after, "recompressed image");
                    progress.images_recompressed += 1;
                }
                Ok(ImageOutcome::Kept { before, after }) => {
                    debug!(page = page.number, object = ?image, before, after, "kept original image");
                    progress.images_kept += 1;
                }
                Err(e) => {
                    warn!(page = page.number, object = ?image, error = %e, "skipped image");
                    progress.images_skipped += 1;
                }
            }

            if options.yield_every_image {
                yielder.yield_now().await;
                check_cancelled(cancel, &progress)?;
            }
        }

        on_page_done(progress.complete_page());
        yielder.yield_now().await;
        check_cancelled(cancel, &progress)?;
    }

    Ok(progress)
}

fn check_cancelled(cancel: &CancelToken, progress: &ProgressState) -> Result<(), ShrinkError> {
    if cancel.is_cancelled() {
        return Err(ShrinkError::Cancelled {
            pages_completed: progress.pages_completed,
            pages_total: progress.pages_total,
        });
    }
    Ok(())
}

fn recompress_image<C: ImageCodec + ?Sized>(
    doc: &mut PdfDocument,
    codec: &C,
    options: &CompressOptions,
    image: ObjectRef,
) -> Result<ImageOutcome, ImageError> {
    let payload = doc.image_payload(image)?;
    let pixels = codec.decode(&payload.bytes, &payload.hints)?;
    let bytes = codec.encode(&pixels, options.quality)?;

    let before = payload.stored_len;
    let after = bytes.len();
    if options.replace == ReplacePolicy::OnlyIfSmaller && after >= before {
        return Ok(ImageOutcome::Kept { before, after });
    }

    doc.replace_image_payload(
        image,
        EncodedImage {
            bytes,
            width: pixels.width,
            height: pixels.height,
            color: pixels.color,
        },
    )?;
    Ok(ImageOutcome::Replaced { before, after })
}
