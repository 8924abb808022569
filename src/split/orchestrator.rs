use crate::error::{Result, SplitAborted};
use crate::split::plan::ChildSpec;
use crate::split::report::{ChildOutcome, SplitReport};
use crate::split::source::{ChildOutput, OutputStore, SourceDocument};
use tracing::{debug, info, warn};

/// Write every planned child, in plan order.
///
/// A failing child is recorded in the report and the run moves on to the next
/// one. Only a fault on the shared source aborts the run; the returned
/// [`SplitAborted`] carries the outcomes recorded so far.
pub fn run<S, O, H>(
    source: &S,
    outputs: &mut O,
    plan: &[ChildSpec],
) -> std::result::Result<SplitReport, SplitAborted>
where
    S: SourceDocument,
    O: OutputStore<H>,
    H: AsMut<S::Output>,
{
    let total_pages = source.total_pages();
    let mut report = SplitReport::default();

    for child in plan {
        match split_child(source, outputs, child, total_pages) {
            Ok(pages_written) => {
                info!(
                    "Wrote {} (pages {}-{})",
                    child.output_name, child.start_page, child.end_page
                );
                report.children.push(ChildOutcome::success(child, pages_written));
            }
            Err(e) if e.is_fatal() => {
                warn!(
                    "Aborting split at child {} of {}: {}",
                    child.sequence_number,
                    plan.len(),
                    e
                );
                report.children.push(ChildOutcome::failure(child, &e));
                return Err(SplitAborted { report, error: e });
            }
            Err(e) => {
                warn!("Child {} ({}) failed: {}", child.sequence_number, child.output_name, e);
                report.children.push(ChildOutcome::failure(child, &e));
            }
        }
    }

    Ok(report)
}

fn split_child<S, O, H>(source: &S, outputs: &mut O, child: &ChildSpec, total_pages: u32) -> Result<u32>
where
    S: SourceDocument,
    O: OutputStore<H>,
    H: AsMut<S::Output>,
{
    child.check_range(total_pages)?;

    let mut handle = outputs.open_output(&child.output_name)?;

    match write_child(source, handle.as_mut(), child) {
        Ok(()) => {
            outputs.close_output(handle)?;
            Ok(child.page_count())
        }
        Err(e) => {
            outputs.abandon_output(handle);
            Err(e)
        }
    }
}

fn write_child<S: SourceDocument>(source: &S, handle: &mut S::Output, child: &ChildSpec) -> Result<()> {
    let first_rotation = source.page_rotation(child.start_page)?;
    let first_page = source
        .page_geometry(child.start_page)?
        .rotated(first_rotation);
    handle.set_page_size(first_page);

    for page in child.start_page..=child.end_page {
        let rotation = source.page_rotation(page)?;
        let geometry = source.page_geometry(page)?.rotated(rotation);
        debug!(
            "Copying page {} ({}x{}, rotated {}) into {}",
            page,
            geometry.width,
            geometry.height,
            rotation.degrees(),
            child.output_name
        );
        source.copy_page_into(handle, page, geometry, rotation)?;
    }
    Ok(())
}
