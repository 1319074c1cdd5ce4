//! Download filename derivation for tuning files.
//!
//! Builds the display name a requester sees when downloading a processed
//! file, from the original upload name and the options chosen at submission.

/// Processing options captured at job submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuneOptions {
    pub dpf_off: bool,
    pub egr_off: bool,
    pub adblue_off: bool,
    pub dtc_off: bool,
    /// Free-text DTC code list, e.g. `"P0401 P2002"`.
    pub dtc_codes: Option<String>,
    pub immo_off: bool,
}

/// Build the display filename for a job's download.
///
/// Appends one parenthesized tag per active option before the extension, in
/// a fixed canonical order: DPF, EGR, AdBlue, DTC, IMMO. The DTC tag carries
/// the trimmed code list when one was supplied. Inactive options contribute
/// no tag.
///
/// # Examples
///
/// ```
/// use ecuflow_core::naming::{download_filename, TuneOptions};
///
/// let options = TuneOptions {
///     dpf_off: true,
///     egr_off: true,
///     ..TuneOptions::default()
/// };
/// assert_eq!(download_filename("map.bin", &options), "map (DPF) (EGR).bin");
/// ```
pub fn download_filename(original: &str, options: &TuneOptions) -> String {
    let (stem, ext) = split_extension(original);

    let mut name = String::from(stem);
    if options.dpf_off {
        name.push_str(" (DPF)");
    }
    if options.egr_off {
        name.push_str(" (EGR)");
    }
    if options.adblue_off {
        name.push_str(" (AdBlue)");
    }
    if options.dtc_off {
        match options
            .dtc_codes
            .as_deref()
            .map(str::trim)
            .filter(|codes| !codes.is_empty())
        {
            Some(codes) => {
                name.push_str(" (DTC ");
                name.push_str(codes);
                name.push(')');
            }
            None => name.push_str(" (DTC)"),
        }
    }
    if options.immo_off {
        name.push_str(" (IMMO)");
    }

    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// Split `name` at the final dot. A missing dot, or a dot in the first
/// position (hidden file), yields an empty extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> TuneOptions {
        TuneOptions {
            dpf_off: true,
            egr_off: true,
            adblue_off: true,
            dtc_off: true,
            dtc_codes: Some("P0401 P2002".to_string()),
            immo_off: true,
        }
    }

    #[test]
    fn no_options_returns_original_name() {
        assert_eq!(
            download_filename("map.bin", &TuneOptions::default()),
            "map.bin"
        );
    }

    #[test]
    fn single_option_tag() {
        let options = TuneOptions {
            dpf_off: true,
            ..TuneOptions::default()
        };
        assert_eq!(download_filename("map.bin", &options), "map (DPF).bin");
    }

    #[test]
    fn canonical_tag_order_is_fixed() {
        assert_eq!(
            download_filename("stage1.bin", &all_on()),
            "stage1 (DPF) (EGR) (AdBlue) (DTC P0401 P2002) (IMMO).bin"
        );
    }

    #[test]
    fn dtc_without_codes_has_bare_tag() {
        let options = TuneOptions {
            dtc_off: true,
            dtc_codes: None,
            ..TuneOptions::default()
        };
        assert_eq!(download_filename("map.bin", &options), "map (DTC).bin");
    }

    #[test]
    fn dtc_codes_are_trimmed() {
        let options = TuneOptions {
            dtc_off: true,
            dtc_codes: Some("  P0300  ".to_string()),
            ..TuneOptions::default()
        };
        assert_eq!(download_filename("map.bin", &options), "map (DTC P0300).bin");
    }

    #[test]
    fn blank_dtc_codes_fall_back_to_bare_tag() {
        let options = TuneOptions {
            dtc_off: true,
            dtc_codes: Some("   ".to_string()),
            ..TuneOptions::default()
        };
        assert_eq!(download_filename("map.bin", &options), "map (DTC).bin");
    }

    #[test]
    fn name_without_extension() {
        let options = TuneOptions {
            egr_off: true,
            ..TuneOptions::default()
        };
        assert_eq!(download_filename("ecudump", &options), "ecudump (EGR)");
    }

    #[test]
    fn only_final_dot_is_the_extension() {
        let options = TuneOptions {
            immo_off: true,
            ..TuneOptions::default()
        };
        assert_eq!(
            download_filename("golf.2019.ori", &options),
            "golf.2019 (IMMO).ori"
        );
    }

    #[test]
    fn hidden_file_has_no_extension_split() {
        let options = TuneOptions {
            dpf_off: true,
            ..TuneOptions::default()
        };
        assert_eq!(download_filename(".hidden", &options), ".hidden (DPF)");
    }

    #[test]
    fn same_inputs_always_yield_same_name() {
        let options = all_on();
        let first = download_filename("map.bin", &options);
        let second = download_filename("map.bin", &options);
        assert_eq!(first, second);

        let inactive = TuneOptions::default();
        assert_ne!(first, download_filename("map.bin", &inactive));
    }
}
