//! Turns completed top-level blocks into match-log entries.
//!
//! Two block readers run side by side. The authoritative `GameState` stream
//! produces entries; the `PowerTaskList` replay of the same blocks often
//! carries names the first stream hid, so its blocks only feed the entity
//! cache.

mod context;
mod targets;


pub use context::{BlockContext, EntityCollection, HealthChange, HealthKind};
pub use targets::detect_target;

use hashbrown::HashSet;
use hearthwatch_types::{EntityId, MatchLogEntry, MatchLogType, Side};
use thiserror::Error;

use crate::events::GameSignal;
use crate::game_data::{LOGGED_TRIGGER_KEYWORDS, block_type, card_type, tag, zone};
use crate::log::{Block, BlockReader, Entity, Entry, GAME_STATE_POWER, POWER_TASK_LIST};
use crate::state::GameState;

#[derive(Debug, Error)]
pub enum MatchLogError {
    #[error("tag {tag} has non-numeric value {value:?}")]
    InvalidTagValue { tag: String, value: String },
}

#[derive(Debug)]
pub struct MatchLogParser {
    authoritative: BlockReader,
    secondary: BlockReader,
}

impl Default for MatchLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchLogParser {
    pub fn new() -> Self {
        Self {
            authoritative: BlockReader::new(GAME_STATE_POWER),
            secondary: BlockReader::new(POWER_TASK_LIST),
        }
    }

    /// Abandon unfinished blocks in both streams.
    pub fn reset(&mut self) {
        self.authoritative.reset();
        self.secondary.reset();
    }

    /// Feed one line to both readers. Returns true when the line was a
    /// structural block production; tag changes and game creation are left
    /// for the fact parsers even though the readers consume them too.
    /// `CREATE_GAME` only resets the reader of the stream that logged it.
    pub fn handle_line(
        &mut self,
        line: &str,
        state: &mut GameState,
        signals: &mut Vec<GameSignal>,
    ) -> bool {
        for reader in [&mut self.authoritative, &mut self.secondary] {
            if reader.is_create_game(line) {
                reader.reset();
                return false;
            }
        }

        let claimed = self.authoritative.recognizes(line) || self.secondary.recognizes(line);

        if let Some(block) = self.authoritative.read_line(line, state) {
            process_top_level(&block, state, signals);
        }
        if let Some(block) = self.secondary.read_line(line, state) {
            BlockContext::new(&block).commit_to_state(state);
        }
        claimed
    }
}

/// Build, record and announce the entries for one top-level block. A block
/// that fails is logged and skipped; the stream carries on.
pub fn process_top_level(block: &Block, state: &mut GameState, signals: &mut Vec<GameSignal>) {
    match build_entries(block, state) {
        Ok(entries) => {
            signals.extend(entries.iter().cloned().map(GameSignal::from_entry));
            state.add_match_log_entries(entries);
        }
        Err(err) => {
            tracing::warn!(
                block_type = %block.block_type,
                source = ?block.source_card().map(|c| c.id),
                target = ?block.target_card().map(|c| c.id),
                error = %err,
                "skipping block"
            );
        }
    }
}

fn build_entries(block: &Block, state: &mut GameState) -> Result<Vec<MatchLogEntry>, MatchLogError> {
    let ctx = BlockContext::new(block);
    ctx.commit_to_state(state);

    match block.block_type.as_str() {
        block_type::DEATHS => {
            let mut deaths = death_set(&ctx);
            mark_deaths_in_log(state.match_log_mut(), &mut deaths);
            Ok(Vec::new())
        }
        block_type::TRIGGER if is_logged_trigger(block) => trigger_entries(&ctx, state),
        block_type::PLAY | block_type::ATTACK => action_entries(&ctx, state),
        _ => Ok(Vec::new()),
    }
}

fn is_logged_trigger(block: &Block) -> bool {
    block
        .trigger_keyword
        .as_deref()
        .is_some_and(|keyword| LOGGED_TRIGGER_KEYWORDS.contains(keyword))
}

// --- Deaths ---

/// Ids moved to the graveyard within this scope.
fn death_set(ctx: &BlockContext<'_>) -> HashSet<EntityId> {
    ctx.flattened_entries()
        .iter()
        .filter_map(|entry| match *entry {
            Entry::Tag(change) if change.tag == tag::ZONE && change.value == zone::GRAVEYARD => {
                change.card().map(|c| c.id)
            }
            Entry::Embedded(e) if e.entity.has_tag(tag::ZONE, zone::GRAVEYARD) => Some(e.entity.id),
            _ => None,
        })
        .collect()
}

/// Newest attack entries first; stops as soon as every death is placed.
fn mark_deaths_in_log(log: &mut [MatchLogEntry], deaths: &mut HashSet<EntityId>) {
    for entry in log.iter_mut().rev() {
        if deaths.is_empty() {
            break;
        }
        if entry.entry_type == MatchLogType::Attack && !entry.is_fully_resolved() {
            mark_dead(entry, deaths);
        }
    }
}

fn mark_dead(entry: &mut MatchLogEntry, deaths: &mut HashSet<EntityId>) {
    for props in entry.participants_mut() {
        if deaths.remove(&props.entity_id) {
            props.dead = Some(true);
        }
    }
}

// --- Triggers ---

fn trigger_entries(
    ctx: &BlockContext<'_>,
    state: &mut GameState,
) -> Result<Vec<MatchLogEntry>, MatchLogError> {
    let mut entries = Vec::new();
    let mut nested_attacks = 0;
    for attack in ctx.blocks().filter(|b| b.is(block_type::ATTACK)) {
        nested_attacks += 1;
        entries.extend(action_entries(&ctx.child(attack), state)?);
    }

    let Some(mut trigger) = source_entry(ctx, state, MatchLogType::Trigger) else {
        return Ok(entries);
    };
    for entry in ctx.flattened_entries() {
        apply_effect(ctx, entry, &mut trigger, state)?;
    }
    if !trigger.targets.is_empty() || nested_attacks == 0 {
        entries.push(trigger);
    }
    Ok(entries)
}

/// Trigger nested in a play or attack. Returns the entry and whether it
/// redirected the primary entry's target.
fn satellite_entry(
    ctx: &BlockContext<'_>,
    primary: &mut MatchLogEntry,
    state: &GameState,
) -> Result<Option<(MatchLogEntry, bool)>, MatchLogError> {
    let Some(mut satellite) = source_entry(ctx, state, MatchLogType::Trigger) else {
        return Ok(None);
    };

    let mut redirected = false;
    if let Some(defender) = proposed_defender(ctx)? {
        let displaced: Vec<EntityId> = primary
            .targets
            .iter()
            .map(|t| t.entity_id)
            .filter(|id| *id != defender)
            .collect();
        if !displaced.is_empty() {
            for id in displaced {
                if let Some(original) = primary.remove_target(id) {
                    satellite.add_target(original);
                }
            }
            let new_target = ctx.latest(defender, state).props();
            satellite.add_target(new_target.clone());
            primary.add_target(new_target);
            redirected = true;
        }
    }

    for entry in ctx.flattened_entries() {
        apply_effect(ctx, entry, &mut satellite, state)?;
    }

    if satellite.targets.is_empty() && !redirected {
        return Ok(None);
    }
    Ok(Some((satellite, redirected)))
}

// --- Plays and attacks ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latest {
    Pre,
    Primary,
    Post,
}

/// Entries produced by one play or attack, in emission order.
#[derive(Debug)]
struct EntryGroup {
    pre: Vec<MatchLogEntry>,
    primary: MatchLogEntry,
    post: Vec<MatchLogEntry>,
    latest: Latest,
}

impl EntryGroup {
    fn new(primary: MatchLogEntry) -> Self {
        Self {
            pre: Vec::new(),
            primary,
            post: Vec::new(),
            latest: Latest::Primary,
        }
    }

    fn push_satellite(&mut self, entry: MatchLogEntry, before_primary: bool) {
        if before_primary {
            self.pre.push(entry);
            self.latest = Latest::Pre;
        } else {
            self.post.push(entry);
            self.latest = Latest::Post;
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut MatchLogEntry> {
        self.pre
            .iter_mut()
            .chain(std::iter::once(&mut self.primary))
            .chain(self.post.iter_mut())
    }

    fn latest_mut(&mut self) -> &mut MatchLogEntry {
        let satellite = match self.latest {
            Latest::Pre => self.pre.last_mut(),
            Latest::Post => self.post.last_mut(),
            Latest::Primary => None,
        };
        satellite.unwrap_or(&mut self.primary)
    }

    /// Deaths go to the first entry that mentions the entity; the rest are
    /// added as dead targets of the newest entry.
    fn distribute_deaths(
        &mut self,
        mut deaths: HashSet<EntityId>,
        ctx: &BlockContext<'_>,
        state: &GameState,
    ) {
        for entry in self.iter_mut() {
            if deaths.is_empty() {
                return;
            }
            mark_dead(entry, &mut deaths);
        }

        let mut leftovers: Vec<EntityId> = deaths.into_iter().collect();
        leftovers.sort_unstable();
        let newest = self.latest_mut();
        for id in leftovers {
            let mut props = ctx.latest(id, state).props();
            props.dead = Some(true);
            newest.add_target(props);
        }
    }

    fn into_entries(self) -> Vec<MatchLogEntry> {
        let mut entries = self.pre;
        entries.push(self.primary);
        entries.extend(self.post);
        entries
    }
}

fn action_entries(
    ctx: &BlockContext<'_>,
    state: &mut GameState,
) -> Result<Vec<MatchLogEntry>, MatchLogError> {
    let block = ctx.block();
    let entry_type = if block.is(block_type::ATTACK) {
        MatchLogType::Attack
    } else {
        MatchLogType::Play
    };
    let Some(mut primary) = source_entry(ctx, state, entry_type) else {
        tracing::debug!(block = %block.describe(), "block source is not a card");
        return Ok(Vec::new());
    };
    let source_id = primary.source.entity_id;

    let declared = block.target_card().map(|c| c.id);
    let mut target = declared;
    let mut redirect = None;
    if block.is(block_type::ATTACK)
        && let Some(defender) = proposed_defender(ctx)?
        && Some(defender) != declared
    {
        if let Some(original) = declared {
            let mut satellite = MatchLogEntry::new(MatchLogType::Trigger, primary.source.clone());
            satellite.add_target(ctx.latest(original, state).props());
            satellite.add_target(ctx.latest(defender, state).props());
            redirect = Some(satellite);
        }
        target = Some(defender);
    }
    if let Some(id) = target
        && id != source_id
    {
        primary.add_target(ctx.latest(id, state).props());
    }
    primary.mana_spent = mana_delta(ctx, state, primary.source.side)?;

    let mut group = EntryGroup::new(primary);
    if let Some(satellite) = redirect {
        group.pre.push(satellite);
    }

    for entry in ctx.flattened_entries() {
        match *entry {
            Entry::Block(child) if child.is(block_type::POWER) => {
                merge_power(&ctx.child(child), &mut group.primary, state, true)?;
            }
            Entry::Block(child) if child.is(block_type::TRIGGER) => {
                let child_ctx = ctx.child(child);
                if let Some((satellite, redirected)) =
                    satellite_entry(&child_ctx, &mut group.primary, state)?
                {
                    group.push_satellite(satellite, redirected);
                }
            }
            Entry::Block(child) if child.is(block_type::DEATHS) => {
                let child_ctx = ctx.child(child);
                group.distribute_deaths(death_set(&child_ctx), &child_ctx, state);
            }
            Entry::Block(_) => {}
            other => apply_effect(ctx, other, &mut group.primary, state)?,
        }
    }

    Ok(group.into_entries())
}

/// Fold a nested POWER block into the entry it belongs to. A hero power's
/// own POWER children are folded in as well, one level deep.
fn merge_power(
    ctx: &BlockContext<'_>,
    primary: &mut MatchLogEntry,
    state: &mut GameState,
    descend: bool,
) -> Result<(), MatchLogError> {
    let hero_power = descend && is_hero_power(ctx, state);
    for entry in ctx.flattened_entries() {
        match *entry {
            Entry::Block(inner) if hero_power && inner.is(block_type::POWER) => {
                merge_power(&ctx.child(inner), primary, state, false)?;
            }
            Entry::Block(_) => {}
            other => apply_effect(ctx, other, primary, state)?,
        }
    }
    primary.mana_spent += mana_delta(ctx, state, primary.source.side)?;
    Ok(())
}

fn is_hero_power(ctx: &BlockContext<'_>, state: &GameState) -> bool {
    ctx.block()
        .source_card()
        .is_some_and(|source| ctx.latest(source.id, state).has_tag(tag::CARDTYPE, card_type::HERO_POWER))
}

// --- Shared helpers ---

fn source_entry(
    ctx: &BlockContext<'_>,
    state: &GameState,
    entry_type: MatchLogType,
) -> Option<MatchLogEntry> {
    let source = ctx.block().source_card()?;
    Some(MatchLogEntry::new(entry_type, ctx.latest(source.id, state).props()))
}

/// Record the effect one entry has on `log_entry`: damage or healing first,
/// otherwise a newly affected target. The source never targets itself.
fn apply_effect(
    ctx: &BlockContext<'_>,
    entry: &Entry,
    log_entry: &mut MatchLogEntry,
    state: &GameState,
) -> Result<(), MatchLogError> {
    if let Some(change) = ctx.detect_health_change(entry) {
        let props = if change.entity_id == log_entry.source.entity_id {
            &mut log_entry.source
        } else {
            log_entry.add_target(ctx.latest(change.entity_id, state).props())
        };
        match change.kind {
            HealthKind::Damage => props.add_damage(change.amount),
            HealthKind::Healing => props.add_healing(change.amount),
        }
        return Ok(());
    }

    if let Some(card) = detect_target(ctx, entry, state)?
        && card.id != log_entry.source.entity_id
    {
        log_entry.add_target(card.props());
    }
    Ok(())
}

/// Last nonzero `PROPOSED_DEFENDER` set directly in this scope. The client
/// clears the tag with `value=0` once the attack resolves.
fn proposed_defender(ctx: &BlockContext<'_>) -> Result<Option<EntityId>, MatchLogError> {
    for entry in ctx.flattened_entries().iter().rev() {
        let Entry::Tag(change) = *entry else {
            continue;
        };
        if change.tag != tag::PROPOSED_DEFENDER {
            continue;
        }
        match change.value.parse::<EntityId>() {
            Ok(0) => continue,
            Ok(id) => return Ok(Some(id)),
            Err(_) => return Err(invalid(tag::PROPOSED_DEFENDER, &change.value)),
        }
    }
    Ok(None)
}

/// Mana spent in this scope, diffed against the player's stored running
/// total. A regressed counter yields a negative delta; with no registered
/// player the raw total is returned and nothing is stored.
fn mana_delta(
    ctx: &BlockContext<'_>,
    state: &mut GameState,
    side: Side,
) -> Result<i32, MatchLogError> {
    let value = ctx.flattened_entries().iter().rev().find_map(|entry| match *entry {
        Entry::Tag(change)
            if change.tag == tag::NUM_RESOURCES_SPENT_THIS_GAME
                && change.entity == Some(Entity::Player { side }) =>
        {
            Some(change.value.as_str())
        }
        _ => None,
    });
    let Some(value) = value else {
        return Ok(0);
    };
    let total: i32 = value
        .parse()
        .map_err(|_| invalid(tag::NUM_RESOURCES_SPENT_THIS_GAME, value))?;

    match state.player_by_side_mut(side) {
        Some(player) => {
            let delta = total - player.mana_spent;
            player.mana_spent = total;
            Ok(delta)
        }
        None => Ok(total),
    }
}

fn invalid(tag: &str, value: &str) -> MatchLogError {
    MatchLogError::InvalidTagValue {
        tag: tag.to_string(),
        value: value.to_string(),
    }
}
