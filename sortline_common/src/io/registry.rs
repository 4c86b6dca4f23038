//! I/O Registry — role-based channel resolution.
//!
//! Built once at startup from `IoConfig`. Immutable after construction.
//! The control unit resolves every role it needs into a [`Channel`] before
//! the scan loop starts; a missing role is a configuration fault.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::config::IoConfig;
use super::role::{DiLogic, IoPointType, IoRole};
use super::tags::{best_match, MatchTier, TagCandidate};

// ─── Error Types ────────────────────────────────────────────────────

/// I/O configuration validation error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IoConfigError {
    /// Two I/O points share the same `(type, pin)` pair (V-IO-1).
    #[error("V-IO-1: duplicate pin ({io_type}, {pin}) in groups '{group_a}' and '{group_b}'")]
    PinDuplicate {
        io_type: IoPointType,
        pin: u16,
        group_a: String,
        group_b: String,
    },
    /// Two I/O points share the same role string (V-IO-2).
    #[error("V-IO-2: duplicate role '{role}' in groups '{group_a}' and '{group_b}'")]
    RoleDuplicate {
        role: String,
        group_a: String,
        group_b: String,
    },
    /// Role assigned to wrong I/O type (V-IO-3).
    #[error("V-IO-3: role '{role}' expects {expected_type} but assigned to {actual_type}")]
    RoleTypeMismatch {
        role: String,
        expected_type: IoPointType,
        actual_type: IoPointType,
    },
    /// A role the line needs has no resolved channel (V-IO-4).
    #[error("V-IO-4: missing required role '{role}'")]
    RoleMissing { role: IoRole },
    /// Role string failed to parse.
    #[error("role parse error for '{role_str}': {error}")]
    RoleParseError { role_str: String, error: String },
}

// ─── Channel ────────────────────────────────────────────────────────

/// One discrete input or coil, as seen by the I/O port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel {
    /// Discrete input or coil.
    pub io_type: IoPointType,
    /// Modbus bit address.
    pub address: u16,
    /// NC input or inverted coil.
    pub inverted: bool,
}

impl Channel {
    /// Normally-open discrete input.
    pub const fn di(address: u16) -> Self {
        Self {
            io_type: IoPointType::Di,
            address,
            inverted: false,
        }
    }

    /// Non-inverted coil.
    pub const fn coil(address: u16) -> Self {
        Self {
            io_type: IoPointType::Do,
            address,
            inverted: false,
        }
    }

    /// Raw bit → logical value.
    #[inline]
    pub const fn logical(&self, raw: bool) -> bool {
        raw ^ self.inverted
    }

    /// Logical value → raw bit.
    #[inline]
    pub const fn physical(&self, value: bool) -> bool {
        value ^ self.inverted
    }
}

// ─── IoBinding ──────────────────────────────────────────────────────

/// How a binding was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    /// Explicit `role = "..."` in io.toml.
    Role,
    /// Matched from the point's tag `name`.
    Tag(MatchTier),
}

/// Runtime binding of a role to its physical I/O point.
#[derive(Debug, Clone)]
pub struct IoBinding {
    /// Group key from io.toml.
    pub group_key: String,
    /// Index within the group's `io` array.
    pub point_idx: usize,
    /// Resolved channel.
    pub channel: Channel,
    /// Tag name, if given.
    pub name: Option<String>,
    pub source: BindingSource,
}

// ─── IoRegistry ─────────────────────────────────────────────────────

/// Runtime I/O registry — maps `IoRole` to `IoBinding`.
#[derive(Debug, Clone, Default)]
pub struct IoRegistry {
    bindings: HashMap<IoRole, IoBinding>,
    pub di_count: u16,
    pub do_count: u16,
}

/// A name-only point waiting for tag matching.
struct Unbound<'a> {
    group_key: &'a str,
    point_idx: usize,
    channel: Channel,
}

impl IoRegistry {
    /// Build the registry from an `IoConfig`, running all validation rules.
    ///
    /// Points with an explicit `role` are bound first. Points that only carry
    /// a tag `name` are then matched against the line's roles that are still
    /// unbound. Returns the first validation error encountered.
    pub fn from_config(config: &IoConfig) -> Result<Self, IoConfigError> {
        let mut bindings = HashMap::new();
        let mut pin_map: HashMap<(IoPointType, u16), String> = HashMap::new();
        let mut role_map: HashMap<String, String> = HashMap::new();
        let mut unbound: Vec<Unbound<'_>> = Vec::new();
        let mut candidates: Vec<TagCandidate> = Vec::new();
        let mut di_count: u16 = 0;
        let mut do_count: u16 = 0;

        for (group_key, idx, point) in config.all_points() {
            match point.io_type {
                IoPointType::Di => di_count += 1,
                IoPointType::Do => do_count += 1,
            }

            // V-IO-1: Pin uniqueness.
            let pin_key = (point.io_type, point.pin);
            if let Some(prev_group) = pin_map.get(&pin_key) {
                return Err(IoConfigError::PinDuplicate {
                    io_type: point.io_type,
                    pin: point.pin,
                    group_a: prev_group.clone(),
                    group_b: group_key.to_string(),
                });
            }
            pin_map.insert(pin_key, group_key.to_string());

            let channel = Channel {
                io_type: point.io_type,
                address: point.pin,
                inverted: match point.io_type {
                    IoPointType::Di => point.logic.unwrap_or_default() == DiLogic::NC,
                    IoPointType::Do => point.inverted.unwrap_or(false),
                },
            };

            let Some(role_str) = &point.role else {
                if let Some(name) = &point.name {
                    unbound.push(Unbound {
                        group_key,
                        point_idx: idx,
                        channel,
                    });
                    candidates.push(TagCandidate::new(name));
                }
                continue;
            };

            // V-IO-2: Role uniqueness.
            if let Some(prev_group) = role_map.get(role_str) {
                return Err(IoConfigError::RoleDuplicate {
                    role: role_str.clone(),
                    group_a: prev_group.clone(),
                    group_b: group_key.to_string(),
                });
            }
            role_map.insert(role_str.clone(), group_key.to_string());

            let role: IoRole = role_str
                .parse()
                .map_err(|e: String| IoConfigError::RoleParseError {
                    role_str: role_str.clone(),
                    error: e,
                })?;

            // V-IO-3: Role type correctness.
            let expected = role.expected_io_type();
            if expected != point.io_type {
                return Err(IoConfigError::RoleTypeMismatch {
                    role: role_str.clone(),
                    expected_type: expected,
                    actual_type: point.io_type,
                });
            }

            bindings.insert(
                role,
                IoBinding {
                    group_key: group_key.to_string(),
                    point_idx: idx,
                    channel,
                    name: point.name.clone(),
                    source: BindingSource::Role,
                },
            );
        }

        Self::bind_by_tag(&mut bindings, &unbound, &candidates);

        Ok(Self {
            bindings,
            di_count,
            do_count,
        })
    }

    /// Bind still-missing line roles to name-only points.
    ///
    /// Exact matches are claimed for every role before any fuzzy tier runs,
    /// so a loose match cannot steal a point another role names exactly.
    fn bind_by_tag(
        bindings: &mut HashMap<IoRole, IoBinding>,
        unbound: &[Unbound<'_>],
        candidates: &[TagCandidate],
    ) {
        if candidates.is_empty() {
            return;
        }
        let mut claimed = vec![false; candidates.len()];

        for exact_only in [true, false] {
            for role in IoRole::line_roles() {
                if bindings.contains_key(&role) {
                    continue;
                }
                // Only offer points of the role's I/O type.
                let type_claimed: Vec<bool> = claimed
                    .iter()
                    .zip(unbound)
                    .map(|(c, u)| *c || u.channel.io_type != role.expected_io_type())
                    .collect();
                let Some((i, tier)) = best_match(&role.tag_aliases(), candidates, &type_claimed)
                else {
                    continue;
                };
                if exact_only && tier != MatchTier::Exact {
                    continue;
                }
                claimed[i] = true;
                debug!(
                    "Bound {role} to '{}' ({:?} match, pin {})",
                    candidates[i].name, tier, unbound[i].channel.address
                );
                bindings.insert(
                    role,
                    IoBinding {
                        group_key: unbound[i].group_key.to_string(),
                        point_idx: unbound[i].point_idx,
                        channel: unbound[i].channel,
                        name: Some(candidates[i].name.clone()),
                        source: BindingSource::Tag(tier),
                    },
                );
            }
        }

        for (i, c) in candidates.iter().enumerate() {
            if !claimed[i] {
                debug!("Tag '{}' matched no line role", c.name);
            }
        }
    }

    /// Look up a binding by role.
    pub fn get(&self, role: &IoRole) -> Option<&IoBinding> {
        self.bindings.get(role)
    }

    /// Resolved channel for a role.
    pub fn channel(&self, role: &IoRole) -> Option<Channel> {
        self.bindings.get(role).map(|b| b.channel)
    }

    /// Check if a role exists in the registry.
    pub fn has_role(&self, role: &IoRole) -> bool {
        self.bindings.contains_key(role)
    }

    /// Number of registered role bindings.
    pub fn role_count(&self) -> usize {
        self.bindings.len()
    }

    /// Validate that every given role is bound (V-IO-4).
    ///
    /// Collects all missing roles rather than stopping at the first.
    pub fn validate_roles(&self, roles: &[IoRole]) -> Result<(), Vec<IoConfigError>> {
        let errors: Vec<IoConfigError> = roles
            .iter()
            .filter(|r| !self.has_role(r))
            .map(|r| IoConfigError::RoleMissing { role: *r })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
