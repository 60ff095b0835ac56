use crate::config::Config;
use anyhow::Result;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Clean raw engine text before metric extraction.
pub fn normalize_text(cfg: &Config, raw: &str) -> Result<String> {
    let mut text = raw.to_string();

    if cfg.normalize.normalize_newlines {
        text = text.replace("\r\n", "\n").replace('\r', "\n");
    }

    if cfg.normalize.normalize_unicode {
        text = text.nfkc().collect::<String>();
    }

    text = sanitize_control_chars(&text, &cfg.normalize.control_chars_to_sanitize);

    if cfg.normalize.collapse_decimal_spacing {
        text = collapse_decimal_spacing(&text)?;
    }

    Ok(text)
}

fn sanitize_control_chars(s: &str, codes: &[u8]) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            if ch == '\n' || ch == '\r' || ch == '\t' {
                return true;
            }
            let cp = ch as u32;
            if cp < 128 { !mask[cp as usize] } else { true }
        })
        .collect()
}

/// PDF text layers often split numbers around the decimal point
/// (`12 . 5 s`); glue them back together.
fn collapse_decimal_spacing(s: &str) -> Result<String> {
    let re = Regex::new(r"(\d)[ \t]*\.[ \t]*(\d)")?;
    Ok(re.replace_all(s, "$1.$2").into_owned())
}
