//! Tool dispatch.
//!
//! Every operation a driver may invoke is a [`Command`] variant wrapping a
//! typed argument struct. Drivers that only have a tool name and JSON
//! arguments go through [`Command::from_call`], which validates the
//! arguments before anything runs. Results come back as a uniform
//! [`ToolResult`] envelope.

use crate::actor::ActionKind;
use crate::clock::EventPayload;
use crate::dice::Advantage;
use crate::error::EngineError;
use crate::position::GridPos;
use crate::rules::Resolution;
use crate::world::World;
use crate::Tool;
use lazy_static::lazy_static;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// A tool as presented to a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Uniform result envelope for every tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    /// Narration, in order.
    pub text_blocks: Vec<String>,
    /// Structured outcome fields.
    pub metadata: Map<String, Value>,
    /// Stable reason code when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl ToolResult {
    pub fn success<T: Serialize>(resolution: &Resolution<T>) -> Self {
        let mut metadata = match serde_json::to_value(&resolution.outcome) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
            Err(err) => {
                let mut map = Map::new();
                map.insert("serialization_error".to_string(), json!(err.to_string()));
                map
            }
        };
        if !resolution.effects.is_empty() {
            if let Ok(effects) = serde_json::to_value(&resolution.effects) {
                metadata.insert("effects".to_string(), effects);
            }
        }
        Self {
            ok: true,
            text_blocks: resolution.narrative.clone(),
            metadata,
            error_reason: None,
        }
    }

    pub fn failure(err: &EngineError) -> Self {
        let mut metadata = Map::new();
        metadata.insert("error_type".to_string(), json!(err.error_type()));
        metadata.insert("message".to_string(), json!(err.to_string()));
        Self {
            ok: false,
            text_blocks: vec![err.to_string()],
            metadata,
            error_reason: Some(err.reason().to_string()),
        }
    }

    /// Narration joined into one block of text.
    pub fn text(&self) -> String {
        self.text_blocks.join("\n")
    }
}

/// Accept `true`/`false` or a mode name for advantage arguments.
fn advantage_arg<'de, D>(deserializer: D) -> Result<Option<Advantage>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Mode(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Flag(flag)) => Ok(Some(Advantage::from_flag(flag))),
        Some(Raw::Mode(mode)) => Advantage::parse(&mode)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unknown advantage mode: {mode}"))),
    }
}

// ============================================================================
// Argument structs
// ============================================================================

/// Roll a dice expression such as "2d6+STR" or "1d20-1"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "roll_dice")]
pub struct RollDiceArgs {
    /// Dice expression: NdM terms, integer constants and ability tokens joined by + or -
    #[serde(alias = "notation")]
    pub expression: String,
    /// Actor whose ability modifiers resolve ability tokens
    #[serde(default)]
    pub actor: Option<String>,
    /// What the roll is for
    #[serde(default)]
    pub purpose: Option<String>,
}

/// Roll a skill check, saving throw or ability check against a difficulty class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "perform_skill_check")]
pub struct PerformSkillCheckArgs {
    /// Actor making the check
    pub actor: String,
    /// Skill name ("perception"), save ("dex save") or ability ("WIS")
    #[serde(alias = "skill")]
    pub skill_or_save: String,
    /// Difficulty class
    #[serde(alias = "difficulty")]
    pub dc: i32,
    /// Roll mode; true means advantage
    #[serde(
        default,
        deserialize_with = "advantage_arg",
        skip_serializing_if = "Option::is_none"
    )]
    #[tool(one_of = "normal, advantage, disadvantage")]
    pub advantage: Option<Advantage>,
}

/// Attack an actor in reach with a held weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "perform_attack")]
pub struct PerformAttackArgs {
    /// Attacking actor
    pub attacker: String,
    /// Intended target
    pub defender: String,
    /// Weapon item id from the attacker's inventory
    #[serde(alias = "weapon")]
    pub weapon_id: String,
    /// Roll mode; true means advantage
    #[serde(
        default,
        deserialize_with = "advantage_arg",
        skip_serializing_if = "Option::is_none"
    )]
    #[tool(one_of = "normal, advantage, disadvantage")]
    pub advantage: Option<Advantage>,
}

/// Close to weapon reach using remaining movement, then attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "auto_engage")]
pub struct AutoEngageArgs {
    /// Attacking actor
    pub attacker: String,
    /// Intended target
    pub defender: String,
    /// Weapon item id from the attacker's inventory
    #[serde(alias = "weapon")]
    pub weapon_id: String,
    /// Roll mode; true means advantage
    #[serde(
        default,
        deserialize_with = "advantage_arg",
        skip_serializing_if = "Option::is_none"
    )]
    #[tool(one_of = "normal, advantage, disadvantage")]
    pub advantage: Option<Advantage>,
}

/// Deal a flat amount of damage to an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "apply_damage")]
pub struct ApplyDamageArgs {
    /// Actor taking damage
    pub target: String,
    /// Damage dealt; must be positive
    pub amount: i32,
    /// What caused the damage
    #[serde(default)]
    pub source: Option<String>,
}

/// Restore hit points to an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "heal")]
pub struct HealArgs {
    /// Actor being healed
    pub target: String,
    /// Hit points restored; must be positive
    pub amount: i32,
    /// What caused the healing
    #[serde(default)]
    pub source: Option<String>,
}

/// Move an actor in straight steps toward a grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "advance_position")]
pub struct AdvancePositionArgs {
    /// Actor to move
    pub actor: String,
    /// Target x coordinate
    pub x: i32,
    /// Target y coordinate
    pub y: i32,
    /// Steps to spend; omit to move as far as the budget allows
    #[serde(default)]
    pub steps: Option<u32>,
}

/// Place an actor on a cell without spending movement; omit x and y to remove them from the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "set_position")]
pub struct SetPositionArgs {
    /// Actor to place
    pub actor: String,
    /// Cell x coordinate
    #[serde(default)]
    pub x: Option<i32>,
    /// Cell y coordinate
    #[serde(default)]
    pub y: Option<i32>,
}

impl SetPositionArgs {
    pub fn position(&self) -> Result<Option<GridPos>, EngineError> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Ok(Some(GridPos::new(x, y))),
            (None, None) => Ok(None),
            _ => Err(EngineError::InvalidArgument(
                "x and y must be given together".to_string(),
            )),
        }
    }
}

/// Read an actor's grid position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "get_position")]
pub struct GetPositionArgs {
    /// Actor to locate
    pub actor: String,
}

/// Set how one actor regards another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "adjust_relation")]
pub struct AdjustRelationArgs {
    /// Actor holding the attitude
    #[serde(alias = "a")]
    pub from: String,
    /// Actor the attitude is about
    #[serde(alias = "b")]
    pub to: String,
    /// New relation value; negative is hostile
    pub value: i32,
    /// Why the relation changed
    #[serde(default)]
    pub reason: Option<String>,
}

/// Add or remove items, optionally taking them from another actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "transfer_item")]
pub struct TransferItemArgs {
    /// Actor receiving (or losing) the items
    pub target: String,
    /// Item id
    pub item: String,
    /// Count to add; negative removes
    #[serde(alias = "n")]
    pub count: i32,
    /// Why the items changed hands
    #[serde(default)]
    pub reason: Option<String>,
    /// Actor giving the items
    #[serde(default)]
    pub from: Option<String>,
}

/// Assign a guardian who intercepts attacks on a protectee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "set_protection")]
pub struct SetProtectionArgs {
    /// Guarding actor
    pub guardian: String,
    /// Protected actor
    pub protectee: String,
}

/// Remove guardian assignments matching the given names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "clear_protection")]
pub struct ClearProtectionArgs {
    /// Only assignments held by this guardian
    #[serde(default)]
    pub guardian: Option<String>,
    /// Only assignments protecting this actor
    #[serde(default)]
    pub protectee: Option<String>,
}

/// Spend an action, bonus action or reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "use_action")]
pub struct UseActionArgs {
    /// Acting actor
    pub actor: String,
    /// Resource spent
    #[tool(one_of = "action, bonus, reaction")]
    pub kind: String,
}

impl UseActionArgs {
    pub fn action_kind(&self) -> Result<ActionKind, EngineError> {
        ActionKind::parse(&self.kind)
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown action kind: {}", self.kind)))
    }
}

/// Start a new round, resetting turn resources and ticking dying countdowns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "begin_round")]
pub struct BeginRoundArgs {}

/// Reset one actor's movement, action, bonus action and reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "reset_actor_turn")]
pub struct ResetActorTurnArgs {
    /// Actor starting their turn
    pub actor: String,
}

/// Start combat with an optional participant order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "start_combat")]
pub struct StartCombatArgs {
    /// Turn order; defaults to every standing actor on the field
    #[serde(default)]
    pub participants: Option<Vec<String>>,
}

/// Schedule a named event at an absolute world minute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "schedule_event")]
pub struct ScheduleEventArgs {
    /// Event name; handlers registered under this name run when it fires
    pub name: String,
    /// Fire time in minutes since midnight of day one
    pub at_min: u32,
    /// Commands to run and data for handlers
    #[serde(default)]
    pub payload: Option<EventPayload>,
}

/// Move the clock forward, firing due events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "advance_time")]
pub struct AdvanceTimeArgs {
    /// Minutes to advance
    #[serde(alias = "minutes")]
    pub mins: u32,
}

/// Add a pending objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "add_objective")]
pub struct AddObjectiveArgs {
    /// Objective label
    pub label: String,
}

/// Mark an objective done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "complete_objective")]
pub struct CompleteObjectiveArgs {
    /// Objective label
    pub label: String,
    /// How it was completed
    #[serde(default)]
    pub note: Option<String>,
}

/// Mark an objective blocked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "block_objective")]
pub struct BlockObjectiveArgs {
    /// Objective label
    pub label: String,
    /// What blocks it
    #[serde(default)]
    pub reason: Option<String>,
}

/// Raise or lower scene tension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "adjust_tension")]
pub struct AdjustTensionArgs {
    /// Change in tension; the result never drops below zero
    pub delta: i32,
}

/// Record a mood mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "add_mark")]
pub struct AddMarkArgs {
    /// Mark text
    pub text: String,
}

/// Change the current scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "set_scene")]
pub struct SetSceneArgs {
    /// Scene name
    pub name: String,
    /// Weather description
    #[serde(default)]
    pub weather: Option<String>,
}

/// Read a copy of the whole world state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tool)]
#[tool(name = "get_snapshot")]
pub struct GetSnapshotArgs {}

// ============================================================================
// Commands
// ============================================================================

/// One engine operation with its arguments.
///
/// Serializes as `{"tool": "<name>", "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
pub enum Command {
    RollDice(RollDiceArgs),
    PerformSkillCheck(PerformSkillCheckArgs),
    PerformAttack(PerformAttackArgs),
    AutoEngage(AutoEngageArgs),
    ApplyDamage(ApplyDamageArgs),
    Heal(HealArgs),
    AdvancePosition(AdvancePositionArgs),
    SetPosition(SetPositionArgs),
    GetPosition(GetPositionArgs),
    AdjustRelation(AdjustRelationArgs),
    TransferItem(TransferItemArgs),
    SetProtection(SetProtectionArgs),
    ClearProtection(ClearProtectionArgs),
    UseAction(UseActionArgs),
    BeginRound(BeginRoundArgs),
    ResetActorTurn(ResetActorTurnArgs),
    StartCombat(StartCombatArgs),
    ScheduleEvent(ScheduleEventArgs),
    AdvanceTime(AdvanceTimeArgs),
    AddObjective(AddObjectiveArgs),
    CompleteObjective(CompleteObjectiveArgs),
    BlockObjective(BlockObjectiveArgs),
    AdjustTension(AdjustTensionArgs),
    AddMark(AddMarkArgs),
    SetScene(SetSceneArgs),
    GetSnapshot(GetSnapshotArgs),
}

lazy_static! {
    static ref TOOL_SPECS: Vec<ToolSpec> = vec![
        RollDiceArgs::as_tool(),
        PerformSkillCheckArgs::as_tool(),
        PerformAttackArgs::as_tool(),
        AutoEngageArgs::as_tool(),
        ApplyDamageArgs::as_tool(),
        HealArgs::as_tool(),
        AdvancePositionArgs::as_tool(),
        SetPositionArgs::as_tool(),
        GetPositionArgs::as_tool(),
        AdjustRelationArgs::as_tool(),
        TransferItemArgs::as_tool(),
        SetProtectionArgs::as_tool(),
        ClearProtectionArgs::as_tool(),
        UseActionArgs::as_tool(),
        BeginRoundArgs::as_tool(),
        ResetActorTurnArgs::as_tool(),
        StartCombatArgs::as_tool(),
        ScheduleEventArgs::as_tool(),
        AdvanceTimeArgs::as_tool(),
        AddObjectiveArgs::as_tool(),
        CompleteObjectiveArgs::as_tool(),
        BlockObjectiveArgs::as_tool(),
        AdjustTensionArgs::as_tool(),
        AddMarkArgs::as_tool(),
        SetSceneArgs::as_tool(),
        GetSnapshotArgs::as_tool(),
    ];
}

/// Every tool a driver can call.
pub fn tool_specs() -> &'static [ToolSpec] {
    TOOL_SPECS.as_slice()
}

impl Command {
    /// Look up a tool by name and validate its JSON arguments.
    pub fn from_call(name: &str, args: &Value) -> Result<Command, EngineError> {
        if !TOOL_SPECS.iter().any(|spec| spec.name == name) {
            return Err(EngineError::UnknownTool(name.to_string()));
        }
        let args = match args {
            Value::Null => json!({}),
            other => other.clone(),
        };
        serde_json::from_value(json!({ "tool": name, "args": args }))
            .map_err(|err| EngineError::InvalidArgument(format!("{name}: {err}")))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::RollDice(_) => RollDiceArgs::tool_name(),
            Command::PerformSkillCheck(_) => PerformSkillCheckArgs::tool_name(),
            Command::PerformAttack(_) => PerformAttackArgs::tool_name(),
            Command::AutoEngage(_) => AutoEngageArgs::tool_name(),
            Command::ApplyDamage(_) => ApplyDamageArgs::tool_name(),
            Command::Heal(_) => HealArgs::tool_name(),
            Command::AdvancePosition(_) => AdvancePositionArgs::tool_name(),
            Command::SetPosition(_) => SetPositionArgs::tool_name(),
            Command::GetPosition(_) => GetPositionArgs::tool_name(),
            Command::AdjustRelation(_) => AdjustRelationArgs::tool_name(),
            Command::TransferItem(_) => TransferItemArgs::tool_name(),
            Command::SetProtection(_) => SetProtectionArgs::tool_name(),
            Command::ClearProtection(_) => ClearProtectionArgs::tool_name(),
            Command::UseAction(_) => UseActionArgs::tool_name(),
            Command::BeginRound(_) => BeginRoundArgs::tool_name(),
            Command::ResetActorTurn(_) => ResetActorTurnArgs::tool_name(),
            Command::StartCombat(_) => StartCombatArgs::tool_name(),
            Command::ScheduleEvent(_) => ScheduleEventArgs::tool_name(),
            Command::AdvanceTime(_) => AdvanceTimeArgs::tool_name(),
            Command::AddObjective(_) => AddObjectiveArgs::tool_name(),
            Command::CompleteObjective(_) => CompleteObjectiveArgs::tool_name(),
            Command::BlockObjective(_) => BlockObjectiveArgs::tool_name(),
            Command::AdjustTension(_) => AdjustTensionArgs::tool_name(),
            Command::AddMark(_) => AddMarkArgs::tool_name(),
            Command::SetScene(_) => SetSceneArgs::tool_name(),
            Command::GetSnapshot(_) => GetSnapshotArgs::tool_name(),
        }
    }
}

/// Reported position of one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReport {
    pub actor: String,
    pub position: Option<GridPos>,
}

impl World {
    /// Run a command and wrap the outcome in a [`ToolResult`].
    pub fn execute(&mut self, command: Command) -> ToolResult {
        let tool = command.name();
        match self.run(command) {
            Ok(result) => {
                debug!(tool, "tool call succeeded");
                result
            }
            Err(err) => {
                warn!(tool, reason = err.reason(), error = %err, "tool call rejected");
                ToolResult::failure(&err)
            }
        }
    }

    /// Look a tool up by name, validate its arguments and run it.
    pub fn call(&mut self, name: &str, args: &Value) -> ToolResult {
        match Command::from_call(name, args) {
            Ok(command) => self.execute(command),
            Err(err) => {
                warn!(tool = name, reason = err.reason(), error = %err, "tool call rejected");
                ToolResult::failure(&err)
            }
        }
    }

    fn run(&mut self, command: Command) -> Result<ToolResult, EngineError> {
        let result = match command {
            Command::RollDice(a) => ToolResult::success(&self.roll_dice(
                &a.expression,
                a.actor.as_deref(),
                a.purpose.as_deref(),
            )?),
            Command::PerformSkillCheck(a) => ToolResult::success(&self.check(
                &a.actor,
                &a.skill_or_save,
                a.dc,
                a.advantage.unwrap_or_default(),
            )?),
            Command::PerformAttack(a) => ToolResult::success(&self.perform_attack(
                &a.attacker,
                &a.defender,
                &a.weapon_id,
                a.advantage.unwrap_or_default(),
            )?),
            Command::AutoEngage(a) => ToolResult::success(&self.auto_engage(
                &a.attacker,
                &a.defender,
                &a.weapon_id,
                a.advantage.unwrap_or_default(),
            )?),
            Command::ApplyDamage(a) => ToolResult::success(&self.apply_damage(
                &a.target,
                a.amount,
                a.source.as_deref().unwrap_or("unspecified"),
            )?),
            Command::Heal(a) => ToolResult::success(&self.heal(
                &a.target,
                a.amount,
                a.source.as_deref().unwrap_or("unspecified"),
            )?),
            Command::AdvancePosition(a) => ToolResult::success(&self.advance_position(
                &a.actor,
                GridPos::new(a.x, a.y),
                a.steps,
            )?),
            Command::SetPosition(a) => {
                let position = a.position()?;
                ToolResult::success(&self.set_position(&a.actor, position)?)
            }
            Command::GetPosition(a) => {
                let position = self.get_position(&a.actor)?;
                let line = match position {
                    Some(pos) => format!("{} is at {pos}.", a.actor),
                    None => format!("{} is off the field.", a.actor),
                };
                ToolResult::success(
                    &Resolution::new(PositionReport {
                        actor: a.actor,
                        position,
                    })
                    .narrate(line),
                )
            }
            Command::AdjustRelation(a) => ToolResult::success(&self.adjust_relation(
                &a.from,
                &a.to,
                a.value,
                a.reason.as_deref().unwrap_or("unspecified"),
            )?),
            Command::TransferItem(a) => ToolResult::success(&self.transfer_item(
                &a.target,
                &a.item,
                a.count,
                a.reason.as_deref().unwrap_or("unspecified"),
                a.from.as_deref(),
            )?),
            Command::SetProtection(a) => {
                ToolResult::success(&self.set_protection(&a.guardian, &a.protectee)?)
            }
            Command::ClearProtection(a) => ToolResult::success(
                &self.clear_protection(a.guardian.as_deref(), a.protectee.as_deref())?,
            ),
            Command::UseAction(a) => {
                let kind = a.action_kind()?;
                ToolResult::success(&self.use_action(&a.actor, kind)?)
            }
            Command::BeginRound(_) => ToolResult::success(&self.begin_round()),
            Command::ResetActorTurn(a) => ToolResult::success(&self.reset_actor_turn(&a.actor)?),
            Command::StartCombat(a) => ToolResult::success(&self.start_combat(a.participants)?),
            Command::ScheduleEvent(a) => ToolResult::success(&self.schedule_event(
                &a.name,
                a.at_min,
                a.payload.unwrap_or_default(),
            )?),
            Command::AdvanceTime(a) => ToolResult::success(&self.advance_time(a.mins)?),
            Command::AddObjective(a) => ToolResult::success(&self.add_objective(&a.label)?),
            Command::CompleteObjective(a) => {
                ToolResult::success(&self.complete_objective(&a.label, a.note.as_deref())?)
            }
            Command::BlockObjective(a) => {
                ToolResult::success(&self.block_objective(&a.label, a.reason.as_deref())?)
            }
            Command::AdjustTension(a) => ToolResult::success(&self.adjust_tension(a.delta)),
            Command::AddMark(a) => ToolResult::success(&self.add_mark(&a.text)?),
            Command::SetScene(a) => {
                ToolResult::success(&self.set_scene(&a.name, a.weather.as_deref())?)
            }
            Command::GetSnapshot(_) => ToolResult::success(&Resolution::new(self.snapshot())),
        };
        Ok(result)
    }
}
