use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;

use crate::foundation::core::{FrameIndex, format_number};
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::source::frame::{ExtractRequest, FrameSource, RawFrame, check_video_bytes};

/// Output pattern handed to ffmpeg. Six digits keep lexicographic and numeric order identical
/// up to 999_999 frames.
pub const FRAME_PATTERN: &str = "frame_%06d.png";

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXT: &str = ".png";

/// How the decoder is told not to drop or duplicate frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncFlag {
    /// `-vsync 0`, understood by every ffmpeg release (deprecated since 5.1).
    Vsync0,
    /// `-fps_mode passthrough`, the replacement introduced in 5.1.
    FpsModePassthrough,
}

impl SyncFlag {
    fn args(self) -> [&'static str; 2] {
        match self {
            Self::Vsync0 => ["-vsync", "0"],
            Self::FpsModePassthrough => ["-fps_mode", "passthrough"],
        }
    }

    /// Pick the flag for an ffmpeg major version; unknown versions get the legacy flag.
    pub fn for_major_version(major: Option<u32>) -> Self {
        match major {
            Some(m) if m >= 6 => Self::FpsModePassthrough,
            _ => Self::Vsync0,
        }
    }
}

/// Options for [`FfmpegFrameSource`].
#[derive(Clone, Debug)]
pub struct FfmpegSourceOpts {
    /// ffmpeg executable, resolved through `PATH` when relative.
    pub binary: PathBuf,
    /// Directory under which per-run staging directories are created.
    pub staging_root: PathBuf,
    /// File name the video bytes are written to inside the staging directory.
    pub input_name: String,
    /// Keep staging directories after the run (debugging aid).
    pub keep_staging: bool,
}

impl Default for FfmpegSourceOpts {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            staging_root: std::env::temp_dir(),
            input_name: "input.mp4".to_string(),
            keep_staging: false,
        }
    }
}

/// Frame source backed by the system `ffmpeg` binary.
///
/// Each extraction runs in its own staging directory, so frames from an earlier run can never
/// leak into a later one.
pub struct FfmpegFrameSource {
    opts: FfmpegSourceOpts,
    sync: Option<SyncFlag>,
    runs: u64,
}

impl FfmpegFrameSource {
    pub fn new(opts: FfmpegSourceOpts) -> Self {
        Self {
            opts,
            sync: None,
            runs: 0,
        }
    }

    pub fn opts(&self) -> &FfmpegSourceOpts {
        &self.opts
    }

    fn staging_dir(&mut self) -> FlipbookResult<StagingDir> {
        self.runs += 1;
        let path = self.opts.staging_root.join(format!(
            "lottie_flipbook_{}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            self.runs
        ));
        std::fs::create_dir_all(&path)
            .with_context(|| format!("create staging directory '{}'", path.display()))?;
        Ok(StagingDir {
            path,
            keep: self.opts.keep_staging,
        })
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new(FfmpegSourceOpts::default())
    }
}

impl FrameSource for FfmpegFrameSource {
    #[tracing::instrument(skip(self), fields(binary = %self.opts.binary.display()))]
    fn load(&mut self) -> FlipbookResult<()> {
        if self.sync.is_some() {
            return Ok(());
        }
        let out = Command::new(&self.opts.binary)
            .arg("-version")
            .output()
            .map_err(|e| {
                FlipbookError::decode(format!(
                    "failed to run '{}' (is ffmpeg installed and on PATH?): {e}",
                    self.opts.binary.display()
                ))
            })?;
        if !out.status.success() {
            return Err(FlipbookError::decode(format!(
                "'{} -version' exited with status {}",
                self.opts.binary.display(),
                out.status
            )));
        }
        let banner = String::from_utf8_lossy(&out.stdout);
        let major = parse_major_version(&banner);
        let sync = SyncFlag::for_major_version(major);
        tracing::debug!(?major, ?sync, "ffmpeg loaded");
        self.sync = Some(sync);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.sync.is_some()
    }

    #[tracing::instrument(skip(self, video), fields(video_bytes = video.len()))]
    fn extract_frames(
        &mut self,
        video: &[u8],
        req: &ExtractRequest,
    ) -> FlipbookResult<Vec<RawFrame>> {
        check_video_bytes(video)?;
        req.validate()?;
        self.load()?;
        let sync = self.sync.unwrap_or(SyncFlag::Vsync0);

        let staging = self.staging_dir()?;
        let input = staging.path.join(&self.opts.input_name);
        std::fs::write(&input, video)
            .with_context(|| format!("write video into '{}'", input.display()))?;

        let vf = video_filter(req);
        let args = decoder_args(&input, &vf, sync, &staging.path.join(FRAME_PATTERN));
        tracing::debug!(%vf, "running ffmpeg frame extraction");

        let out = Command::new(&self.opts.binary)
            .args(&args)
            .output()
            .map_err(|e| FlipbookError::decode(format!("failed to spawn ffmpeg: {e}")))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            tracing::warn!(status = %out.status, "ffmpeg frame extraction failed");
            return Err(FlipbookError::decode(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                stderr.trim()
            )));
        }

        let names = list_frame_names(&staging.path)?;
        let mut frames = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let path = staging.path.join(name);
            let data = std::fs::read(&path)
                .with_context(|| format!("read extracted frame '{}'", path.display()))?;
            let index = u32::try_from(i)
                .map_err(|_| FlipbookError::decode("too many frames extracted"))?;
            frames.push(RawFrame::from_encoded(FrameIndex(index), data)?);
        }
        tracing::debug!(frames = frames.len(), "frames extracted");
        Ok(frames)
    }
}

/// Build the `-vf` expression: frame-rate sampling, plus an aspect-preserving downscale when
/// `scale < 1`.
pub fn video_filter(req: &ExtractRequest) -> String {
    let mut vf = format!("fps={}", format_number(req.frame_rate.as_f64()));
    if req.downscales() {
        let s = format_number(req.scale_factor);
        vf.push_str(&format!(",scale=iw*{s}:ih*{s}"));
    }
    vf
}

/// Full ffmpeg argument list for one extraction.
pub fn decoder_args(input: &Path, vf: &str, sync: SyncFlag, pattern: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_owned());
    args.push("-vf".into());
    args.push(vf.into());
    args.extend(sync.args().into_iter().map(OsString::from));
    args.push(pattern.as_os_str().to_owned());
    args
}

fn list_frame_names(dir: &Path) -> FlipbookResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("list frames in '{}'", dir.display()))?
    {
        let entry = entry.with_context(|| format!("list frames in '{}'", dir.display()))?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(order_frame_names(names))
}

/// Keep `frame_*.png` entries, ordered by their numeric suffix. Names without a parsable number
/// sort after numbered ones, lexicographically.
pub fn order_frame_names(names: Vec<String>) -> Vec<String> {
    let mut frames: Vec<(Option<u64>, String)> = names
        .into_iter()
        .filter(|n| n.starts_with(FRAME_PREFIX) && n.ends_with(FRAME_EXT))
        .map(|n| (frame_number(&n), n))
        .collect();
    frames.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });
    frames.into_iter().map(|(_, n)| n).collect()
}

fn frame_number(name: &str) -> Option<u64> {
    name.strip_prefix(FRAME_PREFIX)?
        .strip_suffix(FRAME_EXT)?
        .parse()
        .ok()
}

/// Major version from an `ffmpeg -version` banner (`ffmpeg version 6.1.1-3ubuntu5 ...`,
/// `ffmpeg version n7.0.2 ...`). Git builds (`N-113...`) report `None`.
pub fn parse_major_version(banner: &str) -> Option<u32> {
    let version = banner
        .lines()
        .next()?
        .split_whitespace()
        .skip_while(|w| *w != "version")
        .nth(1)?;
    let version = version.strip_prefix('n').unwrap_or(version);
    let digits: String = version.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

struct StagingDir {
    path: PathBuf,
    keep: bool,
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staging directory");
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/source/ffmpeg.rs"]
mod tests;
