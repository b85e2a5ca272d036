use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML input file and deserialise into a typed struct.
/// `.yaml` / `.yml` files are parsed as YAML, everything else as JSON.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let value: T = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    log::debug!("loaded input from {}", canonical.display());
    Ok(value)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proforma_core::real_estate::amortization::LoanTerms;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("proforma-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_yaml_loan_terms() {
        let path = write_temp(
            "loan.yaml",
            "principal: 6000000\nrate: 0.06\namortization_periods: 30\nhorizon_periods: 10\n",
        );
        let terms: LoanTerms = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(terms.amortization_periods, 30);
        assert_eq!(terms.horizon_periods, 10);
        assert_eq!(terms.principal.to_string(), "6000000");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_reads_json_loan_terms() {
        let path = write_temp(
            "loan.json",
            r#"{"principal": "1000", "rate": "0.05", "amortization_periods": 5, "horizon_periods": 5}"#,
        );
        let terms: LoanTerms = read_input(path.to_str().unwrap()).unwrap();
        assert_eq!(terms.rate.to_string(), "0.05");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let result: Result<LoanTerms, _> = read_input("/definitely/not/here.json");
        assert!(result.is_err());
    }
}
