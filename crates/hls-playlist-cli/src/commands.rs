//! CLI command implementations

use crate::output::{self, OutputFormat};
use crate::Selection;
use anyhow::{bail, Context as _};
use chrono::Utc;
use hls_playlist::{BitRate, HttpFetcher, LoadOptions, PlayList};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Minimum wait between two reloads of a live playlist
const MIN_RELOAD_WAIT: Duration = Duration::from_secs(2);

/// Settings shared by all commands
pub struct Context {
    pub options: LoadOptions,
    pub fetcher: HttpFetcher,
    pub save_dir: Option<PathBuf>,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(config: Option<&Path>, strict: bool, save_dir: Option<PathBuf>, format: &str) -> anyhow::Result<Self> {
        let mut options = match config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read configuration {}", path.display()))?;
                serde_json::from_str::<LoadOptions>(&text)
                    .with_context(|| format!("invalid configuration {}", path.display()))?
            }
            None => LoadOptions::default(),
        };
        options.strict |= strict;
        Ok(Self { options, fetcher: HttpFetcher::new(), save_dir, format: OutputFormat::from(format) })
    }

    /// Load a playlist from a URL or a file
    pub fn load(&self, source: &str) -> anyhow::Result<PlayList> {
        let mut pl = PlayList::new();
        pl.set_auto_save_directory(self.save_dir.clone());
        if is_url(source) {
            pl.load_url(source, &self.options, &self.fetcher)
                .with_context(|| format!("cannot load {}", source))?;
        } else {
            pl.load_file(source, &self.options)
                .with_context(|| format!("cannot load {}", source))?;
        }
        debug!("loaded {}", pl);
        Ok(pl)
    }

    pub fn reload(&self, pl: &mut PlayList) -> hls_playlist::Result<()> {
        pl.reload(&self.options, &self.fetcher)
    }
}

fn is_url(source: &str) -> bool {
    url::Url::parse(source).map(|url| url.scheme().len() > 1).unwrap_or(false)
}

/// Describe a playlist
pub fn inspect(ctx: &Context, source: &str) -> anyhow::Result<()> {
    let pl = ctx.load(source)?;
    println!("{}", output::render_playlist(&pl, &ctx.format)?);
    Ok(())
}

/// Criteria on alternative renditions, empty strings match anything
#[derive(Debug, Clone, Default)]
pub struct AltSelection {
    pub media_type: String,
    pub name: String,
    pub group_id: String,
    pub language: String,
}

impl AltSelection {
    fn is_empty(&self) -> bool {
        self.media_type.is_empty() && self.name.is_empty() && self.group_id.is_empty() && self.language.is_empty()
    }
}

/// Select a variant or a rendition, print its reference
pub fn select(ctx: &Context, source: &str, selection: &Selection, alt: &AltSelection) -> anyhow::Result<()> {
    check_selection(selection)?;
    let pl = ctx.load(source)?;
    if !pl.is_master() {
        bail!("{} is not a master playlist", source);
    }

    if !alt.is_empty() {
        let Some(index) = pl.select_alt_play_list(&alt.media_type, &alt.name, &alt.group_id, &alt.language) else {
            bail!("could not find a matching rendition in master playlist");
        };
        let rendition = pl.alt_play_list(index).context("rendition index out of range")?;
        info!("selected rendition: {}", rendition);
        println!("{}", output::render_reference(&rendition.reference, &ctx.format)?);
        return Ok(());
    }

    let Some(index) = select_variant(&pl, selection) else {
        bail!("could not find a matching stream in master playlist");
    };
    let variant = pl.play_list(index).context("variant index out of range")?;
    info!("selected playlist: {}", variant);
    println!("{}", output::render_reference(&variant.reference, &ctx.format)?);
    Ok(())
}

/// Regenerate the playlist text
pub fn dump(ctx: &Context, source: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let pl = ctx.load(source)?;
    match output {
        Some(path) => {
            pl.save_file(Some(path.as_path()))
                .with_context(|| format!("cannot save {}", path.display()))?;
            info!("saved {} in {}", pl, path.display());
        }
        None => print!("{}", pl.text_content()?),
    }
    Ok(())
}

/// Follow a media playlist, reloading it while it is live
pub fn follow(
    ctx: &Context,
    source: &str,
    selection: &Selection,
    max_segments: usize,
    start_segment: i64,
) -> anyhow::Result<()> {
    check_selection(selection)?;
    let mut pl = ctx.load(source)?;

    if pl.is_master() {
        info!("downloaded {}", pl);
        pl = load_selected_media(ctx, pl, selection)?;
    }
    if !pl.is_media() {
        bail!("invalid HLS playlist type, expected a media playlist");
    }
    info!("downloaded {}", pl);

    let Some(keep) = segments_to_keep(pl.segment_count(), start_segment) else {
        bail!("empty HLS media playlist");
    };
    while pl.segment_count() > keep {
        pl.pop_first_segment();
        debug!("dropping initial segment");
    }

    let mut count = 0;
    while max_segments == 0 || count < max_segments {
        let Some(seg) = pl.pop_first_segment() else {
            break;
        };
        println!("{}", output::render_segment(&seg, &ctx.format)?);
        count += 1;

        // Reload when at most one segment is left.
        if pl.segment_count() < 2 && pl.is_updatable() {
            if let Err(e) = ctx.reload(&mut pl) {
                warn!("reload failed: {}", e);
            }
            // New segments may appear as late as the estimated end of the previous playlist.
            while pl.segment_count() == 0 && Utc::now() <= pl.termination_utc() {
                std::thread::sleep(reload_wait(pl.target_duration()));
                if let Err(e) = ctx.reload(&mut pl) {
                    warn!("reload failed: {}", e);
                    break;
                }
            }
        }
    }

    info!("HLS playlist completed, {} segments", count);
    Ok(())
}

/// Load one media playlist from a master one, dropping variants which fail
fn load_selected_media(ctx: &Context, mut master: PlayList, selection: &Selection) -> anyhow::Result<PlayList> {
    loop {
        let Some(index) = select_variant(&master, selection) else {
            bail!("could not find a matching stream in master playlist");
        };
        let variant = master.play_list(index).context("variant index out of range")?;
        info!("selected playlist: {}", variant);
        let next = variant.url_string();

        match ctx.load(&next) {
            Ok(media) => return Ok(media),
            Err(e) if master.play_list_count() > 1 => {
                warn!("{:#}, trying another playlist", e);
                master.delete_play_list(index);
            }
            Err(e) => return Err(e.context("no more media playlist to try, giving up")),
        }
    }
}

/// Only one extreme criterion, and not together with bounds
pub fn check_selection(selection: &Selection) -> anyhow::Result<()> {
    let single = [
        selection.lowest_bitrate,
        selection.highest_bitrate,
        selection.lowest_resolution,
        selection.highest_resolution,
    ]
    .iter()
    .filter(|set| **set)
    .count();
    let bounds = [
        selection.min_bitrate,
        selection.max_bitrate,
        u64::from(selection.min_width),
        u64::from(selection.max_width),
        u64::from(selection.min_height),
        u64::from(selection.max_height),
    ]
    .iter()
    .filter(|value| **value > 0)
    .count();

    if single > 1 {
        bail!("specify only one of --lowest-bitrate, --highest-bitrate, --lowest-resolution, --highest-resolution");
    }
    if single > 0 && bounds > 0 {
        bail!("incompatible combination of stream selection options");
    }
    Ok(())
}

pub fn select_variant(master: &PlayList, selection: &Selection) -> Option<usize> {
    if selection.lowest_bitrate {
        master.select_play_list_lowest_bitrate()
    } else if selection.highest_bitrate {
        master.select_play_list_highest_bitrate()
    } else if selection.lowest_resolution {
        master.select_play_list_lowest_resolution()
    } else if selection.highest_resolution {
        master.select_play_list_highest_resolution()
    } else {
        master.select_play_list(
            BitRate(selection.min_bitrate),
            BitRate(selection.max_bitrate),
            selection.min_width,
            selection.max_width,
            selection.min_height,
            selection.max_height,
        )
    }
}

/// Number of segments to keep at the end of the initial playlist.
///
/// Positive starts count from the first segment, negative ones from the last.
/// `None` when the playlist is empty.
pub fn segments_to_keep(count: usize, start_segment: i64) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let keep = if start_segment > 0 {
        let skip = start_segment.unsigned_abs() as usize;
        if skip >= count {
            warn!("playlist has only {} segments, starting at last one", count);
            1
        } else {
            count - skip
        }
    } else if start_segment < 0 {
        let from_end = start_segment.unsigned_abs() as usize;
        if from_end > count {
            warn!("playlist has only {} segments, starting at first one", count);
            count
        } else {
            from_end
        }
    } else {
        count
    };
    Some(keep)
}

/// Half a target duration, at least two seconds
pub fn reload_wait(target_duration: Duration) -> Duration {
    (target_duration / 2).max(MIN_RELOAD_WAIT)
}
