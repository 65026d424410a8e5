//! `folio plan`: report the fetch windows a viewport still needs.

use std::io::Write;

use folio_cache::Window;
use tracing::info;

use crate::cli::{OutputFormat, PlanArgs};
use crate::commands::replay::{Replayed, load_policy, load_script, ordered_cache, replay};
use crate::error::{CliError, CliResult};
use crate::output::render_plan;

pub(crate) fn handle_plan(
    args: &PlanArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> CliResult<()> {
    let script = load_script(&args.script)?;
    let policy = load_policy(args.policy.as_deref())?;
    let viewport = viewport(args);

    let Replayed::Ordered(state) = replay(&script, policy, |_, _, _| Ok(()))? else {
        return Err(CliError::validation("fetch planning requires an ordered script"));
    };

    let windows = ordered_cache(policy).plan_fetches(&state.data, viewport);
    info!(
        windows = windows.len(),
        page_size = policy.page_size,
        "planned fetch windows"
    );
    render_plan(out, &windows, format)
}

fn viewport(args: &PlanArgs) -> Window {
    match (args.start, args.length) {
        (Some(start), Some(length)) => Window::partial(start, length),
        _ => Window::Full,
    }
}
