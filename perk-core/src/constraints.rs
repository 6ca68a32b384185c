use crate::error::AllocError;
use crate::ledger::Ledger;
use crate::types::PerkId;

// ============================================================================
// Constraint entries - the parser's pre-validated output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// "perk>n": floor only; the allocator may level further.
    AtLeast(f64),
    /// "perk<n": ceiling only.
    AtMost(f64),
    /// "perk=n": pinned to exactly n levels.
    Exactly(f64),
}

/// One parsed constraint. Mentioning a perk at all unlocks it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintEntry {
    pub perk: PerkId,
    pub bound: Bound,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse the unlock list and the free-text fixed-constraint string against a
/// ledger's catalog.
///
/// Unlock items without an explicit level ("carpentry,looting") are treated
/// as ">0". Perk names may be abbreviated to any unambiguous prefix.
pub fn parse_constraints(
    fixed: &str,
    unlocks: &str,
    ledger: &Ledger,
) -> Result<Vec<ConstraintEntry>, AllocError> {
    let mut entries = Vec::new();

    let bare_unlocks = !unlocks.contains('>');
    let unlock_items = unlocks.split(',').map(str::trim).filter(|s| !s.is_empty());
    for item in unlock_items {
        if bare_unlocks {
            entries.push(parse_item(&format!("{item}>0"), ledger)?);
        } else {
            entries.push(parse_item(item, ledger)?);
        }
    }

    let fixed_items = fixed.split(',').map(str::trim).filter(|s| !s.is_empty());
    for item in fixed_items {
        entries.push(parse_item(item, ledger)?);
    }

    Ok(entries)
}

/// Parse a single "name<op>level" item, e.g. "power=42" or "tough >= 10".
fn parse_item(item: &str, ledger: &Ledger) -> Result<ConstraintEntry, AllocError> {
    let op_at = item
        .find(['<', '=', '>'])
        .ok_or_else(|| AllocError::MalformedConstraint(item.to_string()))?;
    let name = item[..op_at].trim_end();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(AllocError::MalformedConstraint(item.to_string()));
    }

    let op = &item[op_at..op_at + 1];
    // ">=" and "<=" mean the same as ">" and "<".
    let mut rest = &item[op_at + 1..];
    if let Some(stripped) = rest.strip_prefix('=') {
        rest = stripped;
    }

    let perk = resolve_name(name, ledger)?;
    let level = parse_amount(rest.trim())?;

    let bound = match op {
        ">" => Bound::AtLeast(level),
        "<" => Bound::AtMost(level),
        _ => Bound::Exactly(level),
    };

    Ok(ConstraintEntry { perk, bound })
}

/// Resolve a possibly-abbreviated perk name to a catalog entry.
fn resolve_name(token: &str, ledger: &Ledger) -> Result<PerkId, AllocError> {
    let mut prefix = token.to_ascii_lowercase();
    // Legacy shorthands kept from long-time users: "OK" for Overkill and
    // "Looty" for Looting.
    if let Some(rest) = prefix.strip_prefix("ok") {
        prefix = format!("o{rest}");
    } else if let Some(rest) = prefix.strip_prefix("looty") {
        prefix = format!("l{rest}");
    }

    let mut matches = ledger
        .names()
        .filter(|(_, name)| name.to_ascii_lowercase().starts_with(&prefix));

    let Some((id, _)) = matches.next() else {
        return Err(AllocError::UnknownPerk(token.to_string()));
    };
    if matches.next().is_some() {
        return Err(AllocError::AmbiguousPerk(token.to_string()));
    }
    Ok(id)
}

const SUFFIXES: [&str; 11] = ["K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No", "Dc"];

/// Parse a level or budget expression: plain or scientific notation, or a
/// number with a thousands suffix ("300K", "1.5M").
pub fn parse_amount(text: &str) -> Result<f64, AllocError> {
    let text = text.trim();
    let invalid = || AllocError::InvalidLevel(text.to_string());

    let value = if let Ok(value) = text.parse::<f64>() {
        value
    } else {
        let split = text
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let number: f64 = text[..split].parse().map_err(|_| invalid())?;
        let rank = SUFFIXES
            .iter()
            .position(|s| s.eq_ignore_ascii_case(&text[split..]))
            .ok_or_else(invalid)?;
        number * 1000_f64.powi(rank as i32 + 1)
    };

    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    fn ledger() -> Ledger {
        Ledger::new(default_catalog())
    }

    fn name_of(ledger: &Ledger, entry: &ConstraintEntry) -> String {
        ledger.perk(entry.perk).name().to_string()
    }

    #[test]
    fn parses_exact_and_directional_bounds() {
        let ledger = ledger();
        let entries = parse_constraints("power=42, toughness>51, bait<0", "", &ledger).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(name_of(&ledger, &entries[0]), "Power");
        assert_eq!(entries[0].bound, Bound::Exactly(42.0));
        assert_eq!(entries[1].bound, Bound::AtLeast(51.0));
        assert_eq!(entries[2].bound, Bound::AtMost(0.0));
    }

    #[test]
    fn ge_and_le_collapse_to_directional() {
        let ledger = ledger();
        let entries = parse_constraints("carp>=10, agility<=5", "", &ledger).unwrap();
        assert_eq!(entries[0].bound, Bound::AtLeast(10.0));
        assert_eq!(entries[1].bound, Bound::AtMost(5.0));
    }

    #[test]
    fn bare_unlocks_get_zero_floor() {
        let ledger = ledger();
        let entries = parse_constraints("", "carpentry,looting", &ledger).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.bound == Bound::AtLeast(0.0)));
    }

    #[test]
    fn levelled_unlocks_keep_their_levels() {
        let ledger = ledger();
        let entries = parse_constraints("", "carpentry>38,looting>40", &ledger).unwrap();
        assert_eq!(entries[0].bound, Bound::AtLeast(38.0));
        assert_eq!(entries[1].bound, Bound::AtLeast(40.0));
    }

    #[test]
    fn abbreviations_resolve_unambiguous_prefixes() {
        let ledger = ledger();
        let entries = parse_constraints("carp>10, tough=3", "", &ledger).unwrap();
        assert_eq!(name_of(&ledger, &entries[0]), "Carpentry");
        assert_eq!(name_of(&ledger, &entries[1]), "Toughness");
    }

    #[test]
    fn ok_shorthand_means_overkill() {
        let ledger = ledger();
        let entries = parse_constraints("ok=5", "", &ledger).unwrap();
        assert_eq!(name_of(&ledger, &entries[0]), "Overkill");
    }

    #[test]
    fn ambiguous_prefix_is_rejected() {
        let ledger = ledger();
        let err = parse_constraints("p=3", "", &ledger).unwrap_err();
        assert_eq!(err, AllocError::AmbiguousPerk("p".to_string()));
    }

    #[test]
    fn unknown_perk_is_rejected() {
        let ledger = ledger();
        let err = parse_constraints("warpentry=3", "", &ledger).unwrap_err();
        assert_eq!(err, AllocError::UnknownPerk("warpentry".to_string()));
    }

    #[test]
    fn missing_operator_is_malformed() {
        let ledger = ledger();
        let err = parse_constraints("power", "", &ledger).unwrap_err();
        assert!(matches!(err, AllocError::MalformedConstraint(_)));
    }

    #[test]
    fn suffixed_amounts() {
        assert_eq!(parse_amount("300K").unwrap(), 300_000.0);
        assert_eq!(parse_amount("1.5M").unwrap(), 1_500_000.0);
        assert_eq!(parse_amount("2e9").unwrap(), 2e9);
        assert_eq!(parse_amount("7").unwrap(), 7.0);
        assert_eq!(parse_amount("3qa").unwrap(), 3e15);
    }

    #[test]
    fn bad_amounts_are_invalid_levels() {
        assert!(matches!(
            parse_amount("abc"),
            Err(AllocError::InvalidLevel(_))
        ));
        assert!(matches!(parse_amount(""), Err(AllocError::InvalidLevel(_))));
        assert!(matches!(
            parse_amount("inf"),
            Err(AllocError::InvalidLevel(_))
        ));
        assert!(matches!(
            parse_amount("5X"),
            Err(AllocError::InvalidLevel(_))
        ));
    }
}
