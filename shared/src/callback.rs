//! Selection-token codec
//!
//! Inline keyboards carry an opaque token per choice; the guest's tap echoes
//! the token back. Wire format is `<action>:<argument>`. Decoding goes
//! through a strict parser that rejects malformed shapes as a typed error;
//! a bad token is a reported condition, never a panic.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::catalog;

/// Decoded selection token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Slot pick during booking: `time:<HH:MM>`.
    Time(String),
    /// Zone pick by catalog index: `zone:<idx>`.
    Zone(usize),
    /// Admin confirms a pending booking: `confirm:<id>`.
    Confirm(i64),
    /// Admin rejects a pending booking: `reject:<id>`.
    Reject(i64),
    /// Admin cancels an active booking: `force_cancel:<id>`.
    ForceCancel(i64),
    /// Guest cancels their own booking: `cancel:<id>`.
    CancelOwn(i64),
    /// Review rating pick: `rate:<1..=5>`.
    Rate(u8),
    /// Guest consents to saving the contact pair off a booking:
    /// `save_contact:<id>`.
    SaveContact(i64),
    /// Guest accepts or declines the saved profile: `use_saved:yes|no`.
    UseSaved(bool),
}

/// Token decode failure. Reported back to the actor, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid argument for {action}: {argument}")]
    InvalidArgument { action: String, argument: String },
}

impl Callback {
    /// Encode to the wire form. `parse` of the result is the identity.
    pub fn encode(&self) -> String {
        match self {
            Self::Time(slot) => format!("time:{slot}"),
            Self::Zone(index) => format!("zone:{index}"),
            Self::Confirm(id) => format!("confirm:{id}"),
            Self::Reject(id) => format!("reject:{id}"),
            Self::ForceCancel(id) => format!("force_cancel:{id}"),
            Self::CancelOwn(id) => format!("cancel:{id}"),
            Self::Rate(rating) => format!("rate:{rating}"),
            Self::SaveContact(id) => format!("save_contact:{id}"),
            Self::UseSaved(yes) => format!("use_saved:{}", if *yes { "yes" } else { "no" }),
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn invalid(action: &str, argument: &str) -> CallbackError {
    CallbackError::InvalidArgument {
        action: action.to_string(),
        argument: argument.to_string(),
    }
}

impl FromStr for Callback {
    type Err = CallbackError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (action, argument) = token
            .split_once(':')
            .ok_or_else(|| CallbackError::Malformed(token.to_string()))?;
        if argument.is_empty() {
            return Err(CallbackError::Malformed(token.to_string()));
        }

        let booking_id = || argument.parse::<i64>().map_err(|_| invalid(action, argument));

        match action {
            "time" => Ok(Self::Time(argument.to_string())),
            "zone" => {
                let index: usize =
                    argument.parse().map_err(|_| invalid(action, argument))?;
                if index >= catalog::ZONES.len() {
                    return Err(invalid(action, argument));
                }
                Ok(Self::Zone(index))
            }
            "confirm" => Ok(Self::Confirm(booking_id()?)),
            "reject" => Ok(Self::Reject(booking_id()?)),
            "force_cancel" => Ok(Self::ForceCancel(booking_id()?)),
            "cancel" => Ok(Self::CancelOwn(booking_id()?)),
            "rate" => {
                let rating: u8 = argument.parse().map_err(|_| invalid(action, argument))?;
                if !(1..=5).contains(&rating) {
                    return Err(invalid(action, argument));
                }
                Ok(Self::Rate(rating))
            }
            "save_contact" => Ok(Self::SaveContact(booking_id()?)),
            "use_saved" => match argument {
                "yes" => Ok(Self::UseSaved(true)),
                "no" => Ok(Self::UseSaved(false)),
                _ => Err(invalid(action, argument)),
            },
            _ => Err(CallbackError::UnknownAction(action.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_parse_round_trip() {
        let tokens = [
            Callback::Time("18:00".to_string()),
            Callback::Zone(0),
            Callback::Zone(11),
            Callback::Confirm(42),
            Callback::Reject(42),
            Callback::ForceCancel(7),
            Callback::CancelOwn(7),
            Callback::Rate(5),
            Callback::SaveContact(3),
            Callback::UseSaved(true),
            Callback::UseSaved(false),
        ];
        for token in tokens {
            let wire = token.encode();
            assert_eq!(wire.parse::<Callback>().unwrap(), token, "wire: {wire}");
        }
    }

    #[test]
    fn test_rejects_missing_delimiter() {
        assert!(matches!(
            "confirm42".parse::<Callback>(),
            Err(CallbackError::Malformed(_))
        ));
        assert!(matches!(
            "confirm:".parse::<Callback>(),
            Err(CallbackError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_action() {
        assert_eq!(
            "promote:1".parse::<Callback>(),
            Err(CallbackError::UnknownAction("promote".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(matches!(
            "confirm:abc".parse::<Callback>(),
            Err(CallbackError::InvalidArgument { .. })
        ));
        assert!(matches!(
            "zone:99".parse::<Callback>(),
            Err(CallbackError::InvalidArgument { .. })
        ));
        assert!(matches!(
            "rate:0".parse::<Callback>(),
            Err(CallbackError::InvalidArgument { .. })
        ));
        assert!(matches!(
            "rate:6".parse::<Callback>(),
            Err(CallbackError::InvalidArgument { .. })
        ));
        assert!(matches!(
            "use_saved:maybe".parse::<Callback>(),
            Err(CallbackError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_admin_tokens_carry_ids() {
        assert_eq!(
            "force_cancel:128".parse::<Callback>().unwrap(),
            Callback::ForceCancel(128)
        );
        assert_eq!("cancel:128".parse::<Callback>().unwrap(), Callback::CancelOwn(128));
    }
}
