//! Human-readable rendering of match-log entries.
//!
//! Used by the CLI replay output and by overlays that show a compact
//! action history.

use crate::{EntityProps, MatchLogEntry, MatchLogType, is_unresolved_name};

/// Display name for a participant, falling back to `#<id>` while hidden.
///
/// # Examples
/// ```
/// use hearthwatch_types::{EntityProps, Side};
/// use hearthwatch_types::formatting::display_name;
/// assert_eq!(display_name(&EntityProps::new(12, "Wisp", "CS2_231", Side::Top)), "Wisp");
/// assert_eq!(display_name(&EntityProps::new(12, "", "", Side::Top)), "#12");
/// ```
pub fn display_name(props: &EntityProps) -> String {
    if is_unresolved_name(&props.card_name) {
        format!("#{}", props.entity_id)
    } else {
        props.card_name.clone()
    }
}

/// Participant name plus any damage/healing/death annotations.
fn describe_props(props: &EntityProps) -> String {
    let mut s = display_name(props);
    let mut notes = Vec::new();
    if let Some(dmg) = props.damage {
        notes.push(format!("-{dmg}"));
    }
    if let Some(heal) = props.healing {
        notes.push(format!("+{heal}"));
    }
    if props.is_dead() {
        notes.push("dead".to_string());
    }
    if !notes.is_empty() {
        s.push_str(&format!(" ({})", notes.join(", ")));
    }
    s
}

/// One-line description of an entry.
///
/// # Examples
/// ```
/// use hearthwatch_types::{EntityProps, MatchLogEntry, MatchLogType, Side};
/// use hearthwatch_types::formatting::describe_entry;
/// let mut entry = MatchLogEntry::new(
///     MatchLogType::Play,
///     EntityProps::new(30, "Fireball", "CS2_029", Side::Bottom),
/// );
/// entry.mana_spent = 4;
/// entry.add_target(EntityProps::new(41, "Yeti", "CS2_182", Side::Top)).add_damage(6);
/// assert_eq!(describe_entry(&entry), "[bottom] play Fireball (4 mana) -> Yeti (-6)");
/// ```
pub fn describe_entry(entry: &MatchLogEntry) -> String {
    let verb = match entry.entry_type {
        MatchLogType::Play => "play",
        MatchLogType::Attack => "attack",
        MatchLogType::Trigger => "trigger",
    };
    let side = match entry.source.side {
        crate::Side::Top => "top",
        crate::Side::Bottom => "bottom",
    };

    let mut s = format!("[{side}] {verb} {}", describe_props(&entry.source));
    if entry.mana_spent != 0 {
        s.push_str(&format!(" ({} mana)", entry.mana_spent));
    }
    if !entry.targets.is_empty() {
        let targets: Vec<String> = entry.targets.iter().map(describe_props).collect();
        s.push_str(" -> ");
        s.push_str(&targets.join(", "));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;

    #[test]
    fn describes_attack_with_death() {
        let mut entry = MatchLogEntry::new(
            MatchLogType::Attack,
            EntityProps::new(5, "River Crocolisk", "CS2_120", Side::Top),
        );
        let target = entry.add_target(EntityProps::new(9, "", "", Side::Bottom));
        target.add_damage(2);
        target.dead = Some(true);

        assert_eq!(
            describe_entry(&entry),
            "[top] attack River Crocolisk -> #9 (-2, dead)"
        );
    }
}
