use quarry_nbt::NbtValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A block position in the world (x, y, z integers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Encode as a 64-bit long (1.14+ layout).
    /// x: 26 bits, z: 26 bits, y: 12 bits
    pub fn encode(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.z as u64 & 0x3FFFFFF) << 12)
            | (self.y as u64 & 0xFFF)
    }

    pub fn decode(val: u64) -> Self {
        let x = sign_extend((val >> 38) as i32, 26);
        let z = sign_extend(((val >> 12) & 0x3FFFFFF) as i32, 26);
        let y = sign_extend((val & 0xFFF) as i32, 12);
        Self { x, y, z }
    }

    /// Encode as a 64-bit long (pre-1.14 layout).
    /// x: 26 bits, y: 12 bits, z: 26 bits
    pub fn encode_legacy(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.y as u64 & 0xFFF) << 26)
            | (self.z as u64 & 0x3FFFFFF)
    }

    pub fn decode_legacy(val: u64) -> Self {
        let x = sign_extend((val >> 38) as i32, 26);
        let y = sign_extend(((val >> 26) & 0xFFF) as i32, 12);
        let z = sign_extend((val & 0x3FFFFFF) as i32, 26);
        Self { x, y, z }
    }
}

fn sign_extend(value: i32, bits: u32) -> i32 {
    if value >= 1 << (bits - 1) {
        value - (1 << bits)
    } else {
        value
    }
}

/// Three float rotations, as carried by armor stand poses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotations {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotations {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// A Minecraft resource identifier (e.g., "minecraft:overworld").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub namespace: String,
    pub path: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn minecraft(path: impl Into<String>) -> Self {
        Self::new("minecraft", path)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((ns, path)) = s.split_once(':') {
            Ok(Self::new(ns, path))
        } else {
            Ok(Self::minecraft(s))
        }
    }
}

/// A player's game profile as reported by login success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProfile {
    pub uuid: Uuid,
    pub name: String,
}

/// A `host[:port]` pair to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub const DEFAULT_PORT: u16 = 25565;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty server address".into());
        }
        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port in {:?}", s))?;
                Ok(Self::new(host, port))
            }
            Some(_) => Err(format!("missing host in {:?}", s)),
            None => Ok(Self::new(s, Self::DEFAULT_PORT)),
        }
    }
}

/// Text component for chat and disconnect reasons.
/// Only the parts needed to flatten a message into plain text are modelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextComponent {
    #[serde(default)]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extra: Vec<TextComponent>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translate: None,
            extra: Vec::new(),
        }
    }

    /// Parse a JSON chat payload. Bare strings and malformed JSON are kept as literal text.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(serde_json::Value::String(s)) => Self::plain(s),
            Ok(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value(value).unwrap_or_else(|_| Self::plain(json))
            }
            _ => Self::plain(json),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"text":""}"#.to_string())
    }

    /// Concatenate `text` of this component and all of its children.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain(&mut out);
        out
    }

    fn push_plain(&self, out: &mut String) {
        if self.text.is_empty() {
            if let Some(key) = &self.translate {
                out.push_str(key);
            }
        } else {
            out.push_str(&self.text);
        }
        for child in &self.extra {
            child.push_plain(out);
        }
    }
}

/// Game mode enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameMode {
    Survival = 0,
    Creative = 1,
    Adventure = 2,
    Spectator = 3,
}

impl GameMode {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// The hardcore flag (0x08) is masked off.
    pub fn from_id(id: u8) -> Option<Self> {
        match id & 0x07 {
            0 => Some(GameMode::Survival),
            1 => Some(GameMode::Creative),
            2 => Some(GameMode::Adventure),
            3 => Some(GameMode::Spectator),
            _ => None,
        }
    }
}

/// Block face direction, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Direction::Down),
            1 => Some(Direction::Up),
            2 => Some(Direction::North),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            5 => Some(Direction::East),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        self as i32
    }
}

/// Entity pose (1.14+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Pose {
    #[default]
    Standing,
    FallFlying,
    Sleeping,
    Swimming,
    SpinAttack,
    Sneaking,
    Dying,
}

impl Pose {
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Pose::Standing),
            1 => Some(Pose::FallFlying),
            2 => Some(Pose::Sleeping),
            3 => Some(Pose::Swimming),
            4 => Some(Pose::SpinAttack),
            5 => Some(Pose::Sneaking),
            6 => Some(Pose::Dying),
            _ => None,
        }
    }

    pub fn id(self) -> i32 {
        self as i32
    }
}

/// Villager type, profession and level as sent in 1.14+ metadata.
/// `profession` is the raw wire code; resolve it against the connection's version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VillagerData {
    pub villager_type: i32,
    pub profession: i32,
    pub level: i32,
}

impl Default for VillagerData {
    fn default() -> Self {
        Self {
            villager_type: 2,
            profession: 0,
            level: 1,
        }
    }
}

/// An item stack in an inventory slot or metadata field.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub item_id: i32,
    pub count: i8,
    /// Damage value; only carried on the wire before 1.13.
    pub damage: i16,
    pub nbt: Option<NbtValue>,
}

impl ItemStack {
    pub fn new(item_id: i32, count: i8) -> Self {
        Self {
            item_id,
            count,
            damage: 0,
            nbt: None,
        }
    }
}
