//! Mega-bootloader data hazard filter.
//!
//! Three consecutive `!` (0x21) bytes in an uploaded image trap the legacy
//! bootloader in its monitor mode and hang the upload. Payload streams (font
//! and bitmap data) get the third byte of each run rewritten to a space;
//! structural streams (document and styles regions) cannot be rewritten
//! without corrupting offsets, so a detected run is only reported.
//!
//! Each blob must be filtered before region concatenation: padding inserted
//! between blobs could otherwise create or mask a run across a boundary.

use crate::diag::Diagnostics;

const BANG: u8 = 0x21;

/// Replaces the third byte of every `!!!` run with `0x20`, reading the
/// original bytes throughout so `!!!!` becomes `!!  `. Emits one WARNING if
/// anything was replaced.
pub fn fix_data_for_mega_bootloader(
    data: &[u8],
    object: &str,
    diags: &mut Diagnostics,
) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut detected = false;

    for i in 0..data.len() {
        if i >= 2 && data[i - 2] == BANG && data[i - 1] == BANG && data[i] == BANG {
            detected = true;
            result.push(0x20);
        } else {
            result.push(data[i]);
        }
    }

    if detected {
        diags.warning(
            r#""!!!" detected and replaced with "!! " (Mega bootloader hazard)"#,
            Some(object),
        );
    }

    result
}

/// Scan-only variant for structural data: reports the hazard and leaves the
/// bytes in place. Returns whether a run was found.
pub fn detect_mega_bootloader_hazard(
    data: &[u8],
    object: &str,
    diags: &mut Diagnostics,
) -> bool {
    let detected = data.windows(3).any(|w| w == [BANG, BANG, BANG]);
    if detected {
        diags.error(
            r#""!!!" detected in data, not possible to fix (Mega bootloader hazard)"#,
            Some(object),
        );
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;

    #[test]
    fn triple_bang_is_rewritten_with_warning() {
        let mut diags = Diagnostics::new();
        let fixed = fix_data_for_mega_bootloader(&[33, 33, 33, 10], "font", &mut diags);
        assert_eq!(fixed, vec![33, 33, 32, 10]);
        assert_eq!(diags.count(Severity::Warning), 1);
    }

    #[test]
    fn near_miss_is_untouched_and_silent() {
        let mut diags = Diagnostics::new();
        let fixed = fix_data_for_mega_bootloader(&[33, 33, 34], "font", &mut diags);
        assert_eq!(fixed, vec![33, 33, 34]);
        assert!(diags.entries().is_empty());
    }

    #[test]
    fn four_bangs_rewrite_last_two() {
        let mut diags = Diagnostics::new();
        let fixed = fix_data_for_mega_bootloader(&[33, 33, 33, 33], "bitmap", &mut diags);
        assert_eq!(fixed, vec![33, 33, 32, 32]);
        assert_eq!(diags.count(Severity::Warning), 1);
    }

    #[test]
    fn detect_reports_error_without_mutation() {
        let mut diags = Diagnostics::new();
        assert!(detect_mega_bootloader_hazard(
            &[0, 33, 33, 33, 0],
            "document",
            &mut diags
        ));
        assert_eq!(diags.count(Severity::Error), 1);

        let mut diags = Diagnostics::new();
        assert!(!detect_mega_bootloader_hazard(
            &[33, 33, 32, 33],
            "document",
            &mut diags
        ));
        assert!(diags.entries().is_empty());
    }
}
