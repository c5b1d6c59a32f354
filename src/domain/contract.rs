use crate::domain::model::DataRequest;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_date_range, validate_expiration, validate_symbol};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Right {
    Call,
    Put,
}

impl Right {
    pub fn as_str(&self) -> &'static str {
        match self {
            Right::Call => "C",
            Right::Put => "P",
        }
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Right {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "C" => Ok(Right::Call),
            "P" => Ok(Right::Put),
            other => Err(EtlError::invalid_parameter(
                "right",
                other,
                "right must be either 'C' or 'P'",
            )),
        }
    }
}

/// Stock quote venues served by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    /// NASDAQ Basic
    Nqb,
    /// Merged UTP & CTA
    UtpCta,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Nqb => "nqb",
            Venue::UtpCta => "utp_cta",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Venue {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nqb" => Ok(Venue::Nqb),
            "utp_cta" => Ok(Venue::UtpCta),
            other => Err(EtlError::invalid_parameter(
                "venue",
                other,
                "venue must be either 'nqb' or 'utp_cta'",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start_date: String,
    end_date: String,
}

impl DateRange {
    pub fn new(start_date: &str, end_date: &str) -> Result<Self> {
        validate_date_range(start_date, end_date)?;
        Ok(Self {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
        })
    }

    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    pub fn end_date(&self) -> &str {
        &self.end_date
    }

    pub(crate) fn apply(&self, request: DataRequest) -> DataRequest {
        request
            .param("start_date", &self.start_date)
            .param("end_date", &self.end_date)
    }
}

/// A single option contract. Strikes are in 1/10th of a cent, so a $170
/// strike is `170000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionContract {
    root: String,
    exp: String,
    strike: u32,
    right: Right,
}

impl OptionContract {
    pub fn new(root: &str, exp: &str, strike: u32, right: Right) -> Result<Self> {
        validate_symbol("root", root)?;
        validate_expiration(exp)?;
        Ok(Self {
            root: root.to_string(),
            exp: exp.to_string(),
            strike,
            right,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn exp(&self) -> &str {
        &self.exp
    }

    pub fn strike(&self) -> u32 {
        self.strike
    }

    pub fn right(&self) -> Right {
        self.right
    }

    pub fn identifier(&self) -> String {
        format!("{}_{}_{}_{}", self.root, self.exp, self.strike, self.right)
    }

    pub(crate) fn apply(&self, request: DataRequest) -> DataRequest {
        request
            .param("root", &self.root)
            .param("exp", &self.exp)
            .param("strike", self.strike)
            .param("right", self.right)
    }
}

/// Every contract sharing a root and expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChain {
    root: String,
    exp: String,
}

impl OptionChain {
    pub fn new(root: &str, exp: &str) -> Result<Self> {
        validate_symbol("root", root)?;
        validate_expiration(exp)?;
        Ok(Self {
            root: root.to_string(),
            exp: exp.to_string(),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn exp(&self) -> &str {
        &self.exp
    }

    pub fn identifier(&self) -> String {
        format!("{}_{}", self.root, self.exp)
    }

    pub(crate) fn apply(&self, request: DataRequest) -> DataRequest {
        request.param("root", &self.root).param("exp", &self.exp)
    }
}

/// Inputs the terminal uses when it computes Greeks. Unset fields are not
/// sent, leaving the terminal's own defaults in effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GreeksInputs {
    pub annual_div: Option<f64>,
    pub rate: Option<String>,
    pub rate_value: Option<f64>,
    pub under_price: Option<f64>,
}

impl GreeksInputs {
    pub(crate) fn apply(&self, request: DataRequest) -> DataRequest {
        request
            .param_opt("annual_div", self.annual_div)
            .param_opt("rate", self.rate.as_deref())
            .param_opt("rate_value", self.rate_value)
            .param_opt("under_price", self.under_price)
    }
}

/// Intraday bounds in milliseconds since midnight ET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl TimeWindow {
    pub fn new(start_time: Option<String>, end_time: Option<String>) -> Result<Self> {
        for (field, value) in [("start_time", &start_time), ("end_time", &end_time)] {
            if let Some(value) = value {
                if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(EtlError::invalid_parameter(
                        field,
                        value.as_str(),
                        "expected milliseconds since midnight",
                    ));
                }
            }
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    pub(crate) fn apply(&self, request: DataRequest) -> DataRequest {
        request
            .param_opt("start_time", self.start_time.as_deref())
            .param_opt("end_time", self.end_time.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_parsing_is_case_sensitive() {
        assert_eq!("C".parse::<Right>().unwrap(), Right::Call);
        assert_eq!("P".parse::<Right>().unwrap(), Right::Put);
        assert!("c".parse::<Right>().is_err());
        assert!("CALL".parse::<Right>().is_err());
    }

    #[test]
    fn test_venue_parsing() {
        assert_eq!("nqb".parse::<Venue>().unwrap(), Venue::Nqb);
        assert_eq!("utp_cta".parse::<Venue>().unwrap(), Venue::UtpCta);
        assert!("nyse".parse::<Venue>().is_err());
    }

    #[test]
    fn test_contract_identifier() {
        let contract = OptionContract::new("AAPL", "20240119", 170000, Right::Call).unwrap();
        assert_eq!(contract.identifier(), "AAPL_20240119_170000_C");
        assert!(OptionContract::new("", "20240119", 170000, Right::Put).is_err());
        assert!(OptionContract::new("AAPL", "2024-01-19", 170000, Right::Put).is_err());
    }

    #[test]
    fn test_greeks_inputs_only_send_given_fields() {
        let request = GreeksInputs {
            rate: Some("SOFR".into()),
            under_price: Some(185.25),
            ..Default::default()
        }
        .apply(DataRequest::new("/x", "x", "y"));

        assert_eq!(
            request.params,
            vec![
                ("rate".to_string(), "SOFR".to_string()),
                ("under_price".to_string(), "185.25".to_string())
            ]
        );
    }

    #[test]
    fn test_time_window_requires_digits() {
        assert!(TimeWindow::new(Some("34200000".into()), None).is_ok());
        assert!(TimeWindow::new(Some("09:30".into()), None).is_err());
    }
}
