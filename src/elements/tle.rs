use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::TleError;

pub const TLE_LINE_LENGTH: usize = 69;

/// A validated two-line element set. Never mutated: a newer fetch produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrbitalElements {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
    pub fetched_at: DateTime<Utc>,
}

impl OrbitalElements {
    /// Build from raw lines, enforcing length, prefix and checksum.
    pub fn new(
        name: Option<String>,
        line1: &str,
        line2: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, TleError> {
        let line1 = line1.trim();
        let line2 = line2.trim();
        validate_line(line1, 1)?;
        validate_line(line2, 2)?;
        validate_line_checksum(line1, 1)?;
        validate_line_checksum(line2, 2)?;
        catalog_number(line1)?;

        Ok(Self {
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            line1: line1.to_string(),
            line2: line2.to_string(),
            fetched_at,
        })
    }

    pub fn norad_id(&self) -> u32 {
        // validated at construction; bulk entries are checked by `parse_bulk`
        catalog_number(&self.line1).unwrap_or_default()
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.norad_id()))
    }

    /// Element-set epoch from columns 19-32 of line 1.
    pub fn epoch(&self) -> Option<DateTime<Utc>> {
        let field = self.line1.get(18..32)?.trim();
        let year: i32 = field.get(0..2)?.parse().ok()?;
        let day: f64 = field.get(2..)?.parse().ok()?;
        let year = if year < 57 { 2000 + year } else { 1900 + year };
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
        let millis = ((day - 1.0) * 86_400_000.0).round() as i64;
        Some(start + Duration::milliseconds(millis))
    }

    /// Days between the element epoch and `now`; large values mean stale elements.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<f64> {
        self.epoch()
            .map(|epoch| (now - epoch).num_seconds() as f64 / 86_400.0)
    }
}

/// Mod-10 sum of the first 68 characters: digits count their value, '-' counts 1.
pub fn checksum(line: &str) -> u32 {
    line.chars()
        .take(TLE_LINE_LENGTH - 1)
        .map(|c| match c {
            '0'..='9' => c as u32 - '0' as u32,
            '-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

pub fn validate_checksum(line: &str) -> bool {
    line.len() == TLE_LINE_LENGTH
        && line
            .chars()
            .last()
            .and_then(|c| c.to_digit(10))
            .is_some_and(|digit| digit == checksum(line))
}

fn validate_line(line: &str, number: u8) -> Result<(), TleError> {
    if line.len() != TLE_LINE_LENGTH {
        return Err(TleError::Length {
            line: number,
            len: line.len(),
        });
    }
    if !line.starts_with(&format!("{} ", number)) {
        return Err(TleError::Prefix { line: number });
    }
    Ok(())
}

fn validate_line_checksum(line: &str, number: u8) -> Result<(), TleError> {
    if validate_checksum(line) {
        return Ok(());
    }
    Err(TleError::Checksum {
        line: number,
        computed: checksum(line),
        found: line.chars().last().unwrap_or(' '),
    })
}

fn catalog_number(line1: &str) -> Result<u32, TleError> {
    let field = line1.get(2..7).unwrap_or_default();
    field
        .trim()
        .parse()
        .map_err(|_| TleError::CatalogNumber(field.to_string()))
}

/// Parse a single-satellite provider response: a name line plus two data lines
/// (the name line is optional).
pub fn parse_tle_response(
    content: &str,
    fetched_at: DateTime<Utc>,
) -> Result<OrbitalElements, TleError> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [line1, line2] => OrbitalElements::new(None, line1, line2, fetched_at),
        [name, line1, line2] => {
            OrbitalElements::new(Some(name.to_string()), line1, line2, fetched_at)
        }
        _ => Err(TleError::LineCount(lines.len())),
    }
}

/// Catalog-number keyed element sets from one bulk feed download.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkElements {
    pub satellites: BTreeMap<u32, OrbitalElements>,
}

impl BulkElements {
    pub fn get(&self, norad_id: u32) -> Option<&OrbitalElements> {
        self.satellites.get(&norad_id)
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &OrbitalElements)> {
        self.satellites.iter()
    }
}

/// Parse a bulk feed as consecutive name/line1/line2 groups. Only length and line
/// prefixes are checked here; malformed groups are skipped rather than failing the batch.
pub fn parse_bulk(content: &str, fetched_at: DateTime<Utc>) -> BulkElements {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut bulk = BulkElements::default();
    for group in lines.chunks(3) {
        let [name, line1, line2] = group else {
            log::debug!("Skipping trailing partial element group ({} lines)", group.len());
            continue;
        };

        if let Err(e) = validate_line(line1, 1).and_then(|_| validate_line(line2, 2)) {
            log::debug!("Skipping bulk entry {:?}: {}", name, e);
            continue;
        }

        let norad_id = match catalog_number(line1) {
            Ok(id) => id,
            Err(e) => {
                log::debug!("Skipping bulk entry {:?}: {}", name, e);
                continue;
            }
        };

        bulk.satellites.insert(
            norad_id,
            OrbitalElements {
                name: Some(name.to_string()),
                line1: line1.to_string(),
                line2: line2.to_string(),
                fetched_at,
            },
        );
    }
    bulk
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap()
    }

    #[test]
    fn reference_lines_pass_checksum() {
        assert!(validate_checksum(ISS_LINE1));
        assert!(validate_checksum(ISS_LINE2));
    }

    #[test]
    fn single_digit_mutation_breaks_checksum() {
        // columns 20-31 hold the epoch digits; bumping one digit by one changes the sum by one
        for idx in [20usize, 25, 30] {
            let mut bytes = ISS_LINE1.as_bytes().to_vec();
            let digit = bytes[idx] - b'0';
            bytes[idx] = b'0' + (digit + 1) % 10;
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(!validate_checksum(&mutated), "mutation at {} went unnoticed", idx);
        }
    }

    #[test]
    fn minus_sign_counts_as_one() {
        let body = format!("1 00001U{}", " ".repeat(57)) + "-00";
        assert_eq!(body.len(), 68);
        assert_eq!(checksum(&body), 3);
    }

    #[test]
    fn parses_three_line_response() {
        let elements = parse_tle_response(&iss_response(), now()).unwrap();
        assert_eq!(elements.name.as_deref(), Some(ISS_NAME));
        assert_eq!(elements.norad_id(), 25544);
        assert_eq!(elements.fetched_at, now());
    }

    #[test]
    fn parses_two_line_response_without_name() {
        let text = format!("{}\r\n{}\r\n", ISS_LINE1, ISS_LINE2);
        let elements = parse_tle_response(&text, now()).unwrap();
        assert!(elements.name.is_none());
        assert_eq!(elements.display_name(), "NORAD 25544");
    }

    #[test]
    fn rejects_structural_errors() {
        assert_eq!(
            parse_tle_response("only one line", now()),
            Err(TleError::LineCount(1))
        );
        assert_eq!(
            parse_tle_response(&format!("A\nB\n{}\n{}\n", ISS_LINE1, ISS_LINE2), now()),
            Err(TleError::LineCount(4))
        );
        // two lines read as a name-less pair
        assert_eq!(
            parse_tle_response("ISS\nonly one line", now()),
            Err(TleError::Length { line: 1, len: 3 })
        );

        let short = &ISS_LINE1[..60];
        assert!(matches!(
            OrbitalElements::new(None, short, ISS_LINE2, now()),
            Err(TleError::Length { line: 1, len: 60 })
        ));

        assert!(matches!(
            OrbitalElements::new(None, ISS_LINE2, ISS_LINE1, now()),
            Err(TleError::Prefix { line: 1 })
        ));

        let bad_sum = format!("{}0", &ISS_LINE2[..68]);
        assert!(matches!(
            OrbitalElements::new(None, ISS_LINE1, &bad_sum, now()),
            Err(TleError::Checksum { line: 2, computed: 7, found: '0' })
        ));
    }

    #[test]
    fn epoch_and_age() {
        let elements = parse_tle_response(&iss_response(), now()).unwrap();
        let epoch = elements.epoch().unwrap();
        assert_eq!(epoch.format("%Y-%m-%d %H").to_string(), "2008-09-20 12");
        let age = elements.age_days(now()).unwrap();
        assert!((age - 0.48).abs() < 0.01, "age {}", age);
    }

    #[test]
    fn bulk_parse_skips_malformed_groups() {
        let (a1, a2) = lines_for(43017);
        let (b1, b2) = lines_for(27607);
        let feed = format!(
            "AO-91\n{}\n{}\nBROKEN\n{}\n{}\nSO-50\n{}\n{}\n",
            a1,
            a2,
            &b1[..50],
            b2,
            b1,
            b2
        );

        let bulk = parse_bulk(&feed, now());
        assert_eq!(bulk.len(), 2);
        assert_eq!(bulk.get(43017).unwrap().name.as_deref(), Some("AO-91"));
        assert_eq!(bulk.get(27607).unwrap().name.as_deref(), Some("SO-50"));
    }

    #[test]
    fn bulk_parse_does_not_check_checksums() {
        let bad_sum = format!("{}0", &ISS_LINE2[..68]);
        let feed = format!("ISS\n{}\n{}\n", ISS_LINE1, bad_sum);
        assert_eq!(parse_bulk(&feed, now()).len(), 1);
    }
}
