//! Stored-filename composition and correlation tags.
//!
//! An accepted upload is stored under `{tag}_{original_filename}` where the
//! tag is the submission timestamp (`%Y%m%d_%H%M%S`) followed by a
//! process-wide sequence number, e.g. `20260807_153000_42_holiday.mp4`.
//! The tag names the job's output package and locates its scratch
//! directory, and is recoverable from the stored filename alone so that an
//! out-of-process consumer can derive it from an upload event.

/// Format of the timestamp half of a correlation tag.
pub const TAG_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Compose the stored filename for an upload.
pub fn compose_stored_name(tag: &str, filename: &str) -> String {
    format!("{tag}_{filename}")
}

/// Name of the output package for a correlation tag.
pub fn package_name(tag: &str) -> String {
    format!("frames_{tag}.zip")
}

/// Recover the correlation tag from a stored filename.
///
/// The tag is the three leading `_`-separated numeric segments
/// (date, time, sequence). Returns `None` when the name does not carry one,
/// e.g. for files stored before disambiguation or foreign files.
pub fn correlation_tag(stored_filename: &str) -> Option<&str> {
    let third = stored_filename.match_indices('_').nth(2).map(|(i, _)| i)?;
    let tag = &stored_filename[..third];
    let numeric = tag
        .split('_')
        .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()));
    numeric.then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_through_stored_name() {
        let tag = "20260807_153000_42";
        let stored = compose_stored_name(tag, "holiday.mp4");
        assert_eq!(stored, "20260807_153000_42_holiday.mp4");
        assert_eq!(correlation_tag(&stored), Some(tag));
    }

    #[test]
    fn tag_survives_underscores_in_the_original_name() {
        let stored = compose_stored_name("20260807_153000_7", "my_summer_trip.mov");
        assert_eq!(correlation_tag(&stored), Some("20260807_153000_7"));
    }

    #[test]
    fn foreign_names_have_no_tag() {
        assert_eq!(correlation_tag("holiday.mp4"), None);
        assert_eq!(correlation_tag("my_summer_trip.mov"), None);
        assert_eq!(correlation_tag("a_b_c_d.mp4"), None);
    }

    #[test]
    fn package_name_is_deterministic() {
        assert_eq!(package_name("20260807_153000_1"), "frames_20260807_153000_1.zip");
    }
}
