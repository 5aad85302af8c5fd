//! Textual bucketing-strategy descriptors
//!
//! Two equivalent forms are accepted:
//!
//! - query form: `name?key1=val1&key2=val2`, values percent-decoded
//! - path form: `name/key1/val1/key2/val2`
//!
//! A bare name (`log`, `categorical`) selects the variant's defaults.
//! Unknown names, unknown keys, unparsable numbers and malformed pairs are
//! rejected with [`Error::InvalidDescriptor`]; out-of-range parameters are
//! rejected by the strategy constructors.

use crate::logarithmic::{DecimalBuckets, LogBuckets, LogRegularBuckets};
use crate::regular::RegularBuckets;
use crate::strategy::BucketingStrategy;
use percent_encoding::percent_decode_str;
use tilestat_core::{Error, Result};

/// Parse a descriptor into a validated strategy
pub fn parse(text: &str) -> Result<BucketingStrategy> {
    let text = text.trim();
    let (name, rest) = match text.find(|c| c == '?' || c == '/') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => (text, ""),
    };
    if name.is_empty() {
        return Err(Error::InvalidDescriptor(format!(
            "missing strategy name in '{text}'"
        )));
    }

    let params = parse_params(rest)?;
    let strategy = build(name, &params)?;
    log::debug!("bucketing strategy {strategy} from descriptor '{text}'");
    Ok(strategy)
}

fn decode(raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| Error::InvalidDescriptor(format!("cannot decode '{raw}': {e}")))
}

fn parse_params(rest: &str) -> Result<Vec<(String, String)>> {
    let mut params = Vec::new();
    for segment in rest.split('&').filter(|s| !s.is_empty()) {
        if let Some((key, value)) = segment.split_once('=') {
            params.push((decode(key)?, decode(value)?));
            continue;
        }
        let tokens: Vec<&str> = segment.split('/').collect();
        if tokens.len() % 2 != 0 {
            return Err(Error::InvalidDescriptor(format!(
                "expected key/value pairs, got '{segment}'"
            )));
        }
        for pair in tokens.chunks(2) {
            params.push((decode(pair[0])?, decode(pair[1])?));
        }
    }

    if let Some((_, value)) = params.iter().find(|(k, _)| k.is_empty()) {
        return Err(Error::InvalidDescriptor(format!(
            "empty key for value '{value}'"
        )));
    }
    Ok(params)
}

fn number(key: &str, value: &str) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        Error::InvalidDescriptor(format!("{key}: cannot parse '{value}' as a number"))
    })
}

fn count(key: &str, value: &str) -> Result<u32> {
    let v = number(key, value)?;
    if !v.is_finite() || v.fract() != 0.0 || v < 0.0 || v > u32::MAX as f64 {
        return Err(Error::InvalidDescriptor(format!(
            "{key}: expected a whole number, got '{value}'"
        )));
    }
    Ok(v as u32)
}

fn number_list(key: &str, value: &str) -> Result<Vec<f64>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value.split(',').map(|item| number(key, item)).collect()
}

fn unknown_key(name: &str, key: &str) -> Error {
    Error::InvalidDescriptor(format!("unknown key '{key}' for strategy '{name}'"))
}

/// Apply `base`, `n`/`root` and `scale` over a set of defaults
fn log_params(
    name: &str,
    params: &[(String, String)],
    (mut base, mut n, mut scale): (f64, u32, f64),
) -> Result<(f64, u32, f64)> {
    for (key, value) in params {
        match key.as_str() {
            "base" => base = number(key, value)?,
            "n" | "root" => n = count(key, value)?,
            "scale" => scale = number(key, value)?,
            _ => return Err(unknown_key(name, key)),
        }
    }
    Ok((base, n, scale))
}

fn build(name: &str, params: &[(String, String)]) -> Result<BucketingStrategy> {
    match name.to_ascii_lowercase().as_str() {
        "categorical" => match params.first() {
            Some((key, _)) => Err(unknown_key(name, key)),
            None => Ok(BucketingStrategy::categorical()),
        },
        "log" => {
            let d = LogBuckets::default();
            let (base, n, scale) = log_params(name, params, (d.base(), d.n(), d.scale()))?;
            BucketingStrategy::log(base, n, scale)
        }
        "logregular" | "logquantile" => {
            let d = LogRegularBuckets::default();
            let (base, n, scale) = log_params(name, params, (d.base(), d.n(), d.scale()))?;
            BucketingStrategy::log_regular(base, n, scale)
        }
        "decimal" => {
            let d = DecimalBuckets::default();
            let (base, root, scale) = log_params(name, params, (d.base(), d.root(), d.scale()))?;
            BucketingStrategy::decimal(base, root, scale)
        }
        "regular" => {
            let d = RegularBuckets::default();
            let (mut origin, mut width) = (d.origin(), d.width());
            for (key, value) in params {
                match key.as_str() {
                    "origin" => origin = number(key, value)?,
                    "width" => width = number(key, value)?,
                    _ => return Err(unknown_key(name, key)),
                }
            }
            BucketingStrategy::regular(origin, width)
        }
        "explicit" => {
            let mut bounds = Vec::new();
            for (key, value) in params {
                match key.as_str() {
                    "bounds" => bounds = number_list(key, value)?,
                    _ => return Err(unknown_key(name, key)),
                }
            }
            BucketingStrategy::explicit(bounds)
        }
        _ => Err(Error::InvalidDescriptor(format!(
            "unknown bucketing strategy '{name}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_names_use_defaults() {
        assert_eq!(parse("log").unwrap(), BucketingStrategy::default());
        assert_eq!(parse("categorical").unwrap(), BucketingStrategy::Categorical);
        assert_eq!(
            parse("regular").unwrap(),
            BucketingStrategy::regular(0.0, 20.0).unwrap()
        );
        assert_eq!(
            parse("logRegular").unwrap(),
            BucketingStrategy::log_regular(10.0, 5, 0.1).unwrap()
        );
        assert_eq!(
            parse("decimal").unwrap(),
            BucketingStrategy::decimal(10.0, 3, 0.1).unwrap()
        );
        assert_eq!(parse("explicit").unwrap(), BucketingStrategy::explicit(vec![]).unwrap());
    }

    #[test]
    fn test_query_form() {
        assert_eq!(
            parse("regular?origin=5&width=10").unwrap(),
            BucketingStrategy::regular(5.0, 10.0).unwrap()
        );
        assert_eq!(
            parse("log?base=2&n=4").unwrap(),
            BucketingStrategy::log(2.0, 4, 0.1).unwrap()
        );
    }

    #[test]
    fn test_path_form() {
        assert_eq!(
            parse("regular/origin/5/width/10").unwrap(),
            BucketingStrategy::regular(5.0, 10.0).unwrap()
        );
        assert_eq!(
            parse("decimal/base/10/root/4/scale/1").unwrap(),
            BucketingStrategy::decimal(10.0, 4, 1.0).unwrap()
        );
    }

    #[test]
    fn test_log_quantile_alias() {
        assert_eq!(
            parse("logQuantile?n=3").unwrap(),
            BucketingStrategy::log_regular(10.0, 3, 0.1).unwrap()
        );
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            parse("explicit?bounds=10%2C20%2C30").unwrap(),
            BucketingStrategy::explicit(vec![10.0, 20.0, 30.0]).unwrap()
        );
        assert_eq!(
            parse("regular?origin=%2D5").unwrap(),
            BucketingStrategy::regular(-5.0, 20.0).unwrap()
        );
    }

    #[test]
    fn test_explicit_bounds_with_infinity() {
        let strategy = parse("explicit?bounds=-3,-0.1,0,0.3,5,5000,Infinity").unwrap();
        assert_eq!(strategy.compute_bucket_bounds(0.1), (0.0, 0.3));
        assert_eq!(strategy.compute_bucket_bounds(6000.0), (5000.0, f64::INFINITY));
    }

    #[test]
    fn test_descriptor_errors() {
        assert!(matches!(parse("cubic"), Err(Error::InvalidDescriptor(_))));
        assert!(matches!(parse(""), Err(Error::InvalidDescriptor(_))));
        assert!(matches!(parse("?base=10"), Err(Error::InvalidDescriptor(_))));
        assert!(matches!(parse("log?width=3"), Err(Error::InvalidDescriptor(_))));
        assert!(matches!(parse("log?base=ten"), Err(Error::InvalidDescriptor(_))));
        assert!(matches!(parse("log?n=2.5"), Err(Error::InvalidDescriptor(_))));
        assert!(matches!(parse("log/base/10/n"), Err(Error::InvalidDescriptor(_))));
        assert!(matches!(parse("categorical?n=3"), Err(Error::InvalidDescriptor(_))));
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(parse("explicit/bounds/30,30"), Err(Error::InvalidParameter(_))));
        assert!(matches!(parse("log?base=1"), Err(Error::InvalidParameter(_))));
        assert!(matches!(parse("regular?width=0"), Err(Error::InvalidParameter(_))));
        assert!(matches!(parse("logRegular?n=10"), Err(Error::InvalidParameter(_))));
    }
}
