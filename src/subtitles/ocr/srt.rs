//! SRT cue synthesis from timed OCR samples.

use std::fmt::Write as _;

/// Display time of the last cue, which has no following sample to end it.
pub const FINAL_CUE_SECS: f64 = 5.0;

/// One recognized line of text at a point in the video.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub at_secs: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// 1-based position in the document.
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Format seconds as `HH:MM:SS,mmm`.
///
/// ```
/// use scenescribe::subtitles::ocr::format_timestamp;
///
/// assert_eq!(format_timestamp(61.5), "00:01:01,500");
/// assert_eq!(format_timestamp(3723.004), "01:02:03,004");
/// ```
pub fn format_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        ms
    )
}

/// Build cues from samples in time order. Each cue ends where the next one
/// starts; the last lasts [`FINAL_CUE_SECS`].
pub fn build_cues(samples: &[Sample]) -> Vec<Cue> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let end_secs = samples
                .get(i + 1)
                .map(|next| next.at_secs)
                .unwrap_or(sample.at_secs + FINAL_CUE_SECS);
            Cue {
                index: i + 1,
                start_secs: sample.at_secs,
                end_secs,
                text: sample.text.clone(),
            }
        })
        .collect()
}

/// Render cues as an SRT document.
pub fn render_srt(cues: &[Cue]) -> String {
    let mut out = String::new();
    for cue in cues {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_timestamp(cue.start_secs),
            format_timestamp(cue.end_secs),
            cue.text
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(at_secs: f64, text: &str) -> Sample {
        Sample {
            at_secs,
            text: text.into(),
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_timestamp(95.0), "00:01:35,000");
        assert_eq!(format_timestamp(36000.0), "10:00:00,000");
        assert_eq!(format_timestamp(1.0006), "00:00:01,001");
    }

    #[test]
    fn test_cue_end_times() {
        let cues = build_cues(&[sample(61.5, "Hello there"), sample(90.0, "General Kenobi")]);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].index, 1);
        assert_eq!(format_timestamp(cues[0].start_secs), "00:01:01,500");
        assert_eq!(cues[0].end_secs, 90.0);
        assert_eq!(cues[1].index, 2);
        assert_eq!(format_timestamp(cues[1].end_secs), "00:01:35,000");
    }

    #[test]
    fn test_render_srt() {
        let doc = render_srt(&build_cues(&[sample(1.0, "One"), sample(2.0, "Two\nlines")]));
        assert_eq!(
            doc,
            "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n\
             2\n00:00:02,000 --> 00:00:07,000\nTwo\nlines\n\n"
        );
    }

    #[test]
    fn test_no_samples() {
        assert!(build_cues(&[]).is_empty());
        assert_eq!(render_srt(&[]), "");
    }
}
