//! Read-only commands over the local archive

use super::display::{render_search, render_stats};
use crate::services::{archive_stats, search_archive};
use crate::state::AppState;
use crate::types::error::Result;

pub fn search(state: &AppState, query: &str) -> Result<()> {
    let results = search_archive(&state.pool, query)?;
    print!("{}", render_search(query, &results));
    Ok(())
}

pub fn stats(state: &AppState) -> Result<()> {
    print!("{}", render_stats(&archive_stats(&state.pool)?));
    Ok(())
}
