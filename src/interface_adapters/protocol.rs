// Wire protocol DTOs and conversions for the public websocket endpoint.
//
// Field names are PascalCase on the wire; numbers are rounded to two decimals.

use crate::domain::{BodyId, BodySnapshot, Point, Rect, UniverseSnapshot, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients. Exactly one field is set per message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameStateDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_body_id: Option<String>,
}

impl ServerMessage {
    pub fn game_state(snapshot: &UniverseSnapshot) -> Self {
        Self {
            game_state: Some(GameStateDto::from(snapshot)),
            ..Self::default()
        }
    }

    pub fn assigned_body_id(id: BodyId) -> Self {
        Self {
            assigned_body_id: Some(id.to_string()),
            ..Self::default()
        }
    }
}

/// Messages clients send. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientMessage {
    #[serde(default, alias = "thrust")]
    pub thrust: Option<VectorDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameStateDto {
    pub bounds: RectDto,
    // Keyed by decimal body id.
    pub bodies: BTreeMap<String, BodyViewDto>,
}

impl From<&UniverseSnapshot> for GameStateDto {
    fn from(snapshot: &UniverseSnapshot) -> Self {
        Self {
            bounds: RectDto::from(snapshot.bounds),
            bodies: snapshot
                .bodies
                .iter()
                .map(|body| (body.id.to_string(), BodyViewDto::from(body)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BodyViewDto {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub major_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub minor_name: String,
    pub position: PointDto,
    pub mass: f64,
    pub radius: f64,
    pub net_force: VectorDto,
}

impl From<&BodySnapshot> for BodyViewDto {
    fn from(body: &BodySnapshot) -> Self {
        Self {
            major_name: body.major_name.clone(),
            minor_name: body.minor_name.clone(),
            position: PointDto::from(body.position),
            mass: round2(body.mass),
            radius: round2(body.radius),
            net_force: VectorDto::from(body.net_force),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PointDto {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for PointDto {
    fn from(p: Point) -> Self {
        Self {
            x: round2(p.x),
            y: round2(p.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VectorDto {
    #[serde(default, alias = "x")]
    pub x: f64,
    #[serde(default, alias = "y")]
    pub y: f64,
}

impl From<Vector> for VectorDto {
    fn from(v: Vector) -> Self {
        Self {
            x: round2(v.x),
            y: round2(v.y),
        }
    }
}

impl From<VectorDto> for Vector {
    fn from(v: VectorDto) -> Self {
        Vector::new(v.x, v.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RectDto {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<Rect> for RectDto {
    fn from(r: Rect) -> Self {
        Self {
            x: round2(r.x),
            y: round2(r.y),
            w: round2(r.w),
            h: round2(r.h),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
