use anyhow::{Result, bail};

use crate::catalog::Catalog;
use crate::model::Millis;

/// Positional read of one shorthand line. Fields fill in left to right and
/// stay `None` from the first token that does not fit; nothing here decides
/// whether the line is complete enough to act on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedInput {
    pub map_level: Option<u32>,
    pub map_name: Option<String>,
    pub channel: Option<u32>,
    pub token: Option<String>,
}

/// Split a line like `83 2 1.35.45` or `70 水路橋地區 3 on`.
///
/// The second token is ambiguous: a level can host several named maps, so
/// it is first looked up as `(level, name)` in the catalog and only treated
/// as a channel number when that lookup misses. A second token that is
/// neither is carried as the time/state token so stage shorthand in the
/// channel slot does not blow up; the caller will find the channel missing.
pub fn parse_line(line: &str, catalog: &Catalog) -> ParsedInput {
    let mut out = ParsedInput::default();
    let mut parts = line.split_whitespace();

    let Some(first) = parts.next() else {
        return out;
    };
    let Ok(level) = first.parse::<u32>() else {
        return out;
    };
    out.map_level = Some(level);

    let Some(second) = parts.next() else {
        return out;
    };
    if catalog.find(level, second.trim()).is_some() {
        out.map_name = Some(second.trim().to_string());
        if let Some(third) = parts.next() {
            match third.parse::<u32>() {
                Ok(ch) => {
                    out.channel = Some(ch);
                    out.token = parts.next().map(str::to_string);
                }
                Err(_) => out.token = Some(third.to_string()),
            }
        }
    } else {
        match second.parse::<u32>() {
            Ok(ch) => {
                out.channel = Some(ch);
                out.token = parts.next().map(str::to_string);
            }
            Err(_) => out.token = Some(second.to_string()),
        }
    }
    out
}

/// What a time/state token asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeToken {
    On,
    Stage { stage: u32, max: u32 },
    /// Cooldown ending this many seconds from now.
    Cooldown { seconds: u64 },
}

/// Upper bound on any entered duration; keeps the millisecond arithmetic
/// far away from integer limits.
pub const MAX_DURATION_SECS: u64 = 7 * 24 * 3600;

impl TimeToken {
    pub fn respawn_at(seconds: u64, now: Millis) -> Millis {
        now.saturating_add((seconds as i64).saturating_mul(1000))
    }
}

/// Grammar, in match order: `on` (any case), `current/max` stage notation,
/// dotted/colon duration, bare minutes. `nosec` shifts two-part durations
/// from minutes.seconds to hours.minutes by appending a `.0` before the
/// split.
pub fn parse_time_token(raw: &str, nosec: bool) -> Result<TimeToken> {
    let token = raw.trim();
    if token.is_empty() {
        bail!("empty time or state token");
    }

    if token.eq_ignore_ascii_case("on") {
        return Ok(TimeToken::On);
    }

    if token.contains('/') {
        let mut parts = token.splitn(2, '/');
        let stage = parts.next().unwrap_or_default().trim().parse::<u32>();
        let max = parts.next().unwrap_or_default().trim().parse::<u32>();
        match (stage, max) {
            (Ok(stage), Ok(max)) if stage >= 1 && max >= stage => {
                return Ok(TimeToken::Stage { stage, max });
            }
            _ => bail!("bad stage notation {:?} (want current/max)", token),
        }
    }

    if token.contains('.') || token.contains(':') {
        let seconds = parse_duration_seconds(token, nosec)?;
        return Ok(TimeToken::Cooldown { seconds });
    }

    match token.parse::<u64>() {
        Ok(minutes) => Ok(TimeToken::Cooldown {
            seconds: capped(minutes.checked_mul(60), token)?,
        }),
        Err(_) => bail!("bad time or state token {:?}", token),
    }
}

fn capped(seconds: Option<u64>, token: &str) -> Result<u64> {
    match seconds {
        Some(s) if s <= MAX_DURATION_SECS => Ok(s),
        _ => bail!("duration {:?} is too long", token),
    }
}

fn parse_duration_seconds(token: &str, nosec: bool) -> Result<u64> {
    let expanded;
    let token = if nosec && token.split(['.', ':']).count() == 2 {
        expanded = format!("{}.0", token);
        expanded.as_str()
    } else {
        token
    };

    let mut parts = Vec::new();
    for p in token.split(['.', ':']) {
        match p.parse::<u64>() {
            Ok(n) => parts.push(n),
            Err(_) => bail!("bad duration {:?}", token),
        }
    }
    match parts.as_slice() {
        [minutes, seconds] => capped(
            minutes.checked_mul(60).and_then(|m| m.checked_add(*seconds)),
            token,
        ),
        [hours, minutes, seconds] => capped(
            hours
                .checked_mul(3600)
                .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
                .and_then(|hm| hm.checked_add(*seconds)),
            token,
        ),
        _ => bail!("bad duration {:?} (want mm.ss or hh.mm.ss)", token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> ParsedInput {
        parse_line(line, &Catalog::builtin())
    }

    #[test]
    fn level_channel_time() {
        let p = parsed("83 2 1.35.45");
        assert_eq!(
            p,
            ParsedInput {
                map_level: Some(83),
                map_name: None,
                channel: Some(2),
                token: Some("1.35.45".to_string()),
            }
        );
        let tok = parse_time_token(p.token.as_deref().unwrap(), false).unwrap();
        assert_eq!(
            tok,
            TimeToken::Cooldown {
                seconds: 3600 + 35 * 60 + 45
            }
        );
    }

    #[test]
    fn map_name_claims_the_second_slot() {
        let p = parsed("70 水路橋地區 3 on");
        assert_eq!(p.map_name.as_deref(), Some("水路橋地區"));
        assert_eq!(p.channel, Some(3));
        assert_eq!(p.token.as_deref(), Some("on"));
    }

    #[test]
    fn unknown_second_token_is_not_a_name() {
        // Not a known map at level 83, so it falls through to channel
        // parsing and then to the time slot.
        let p = parsed("83 大教堂 2");
        assert_eq!(p.map_name, None);
        assert_eq!(p.channel, None);
        assert_eq!(p.token.as_deref(), Some("大教堂"));
    }

    #[test]
    fn stage_token_in_channel_slot_leaves_channel_unset() {
        let p = parsed("80 1/4");
        assert_eq!(p.map_level, Some(80));
        assert_eq!(p.channel, None);
        assert_eq!(p.token.as_deref(), Some("1/4"));
    }

    #[test]
    fn non_numeric_first_token_stops_parsing() {
        assert_eq!(parsed("abc 2 5"), ParsedInput::default());
        assert_eq!(parsed(""), ParsedInput::default());
    }

    #[test]
    fn time_token_grammar() {
        assert_eq!(parse_time_token("ON", false).unwrap(), TimeToken::On);
        assert_eq!(
            parse_time_token("3/4", false).unwrap(),
            TimeToken::Stage { stage: 3, max: 4 }
        );
        assert_eq!(
            parse_time_token("25.10", false).unwrap(),
            TimeToken::Cooldown {
                seconds: 25 * 60 + 10
            }
        );
        assert_eq!(
            parse_time_token("1:10:05", false).unwrap(),
            TimeToken::Cooldown {
                seconds: 3600 + 10 * 60 + 5
            }
        );
        assert_eq!(
            parse_time_token("5", false).unwrap(),
            TimeToken::Cooldown { seconds: 300 }
        );
        assert!(parse_time_token("soon", false).is_err());
        assert!(parse_time_token("1.2.3.4", false).is_err());
        assert!(parse_time_token("0/4", false).is_err());
        assert!(parse_time_token("5/4", false).is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert!(parse_time_token("999999999999999999", false).is_err());
        assert!(parse_time_token("999999999999999999.0", false).is_err());
        assert!(parse_time_token("999999999999.0.0", false).is_err());
        // A week is the ceiling; a day is fine.
        assert!(parse_time_token("24.0.0", false).is_ok());
        assert!(parse_time_token("200.0.0", false).is_err());
    }

    #[test]
    fn nosec_promotes_two_part_durations_to_hours() {
        assert_eq!(
            parse_time_token("1.30", true).unwrap(),
            TimeToken::Cooldown { seconds: 5400 }
        );
        // Three-part input is unaffected.
        assert_eq!(
            parse_time_token("1.30.10", true).unwrap(),
            TimeToken::Cooldown { seconds: 5410 }
        );
    }
}
