//! Small helpers shared between command handlers.

use syrlink_core::ActionValue;

use crate::error::CliError;

/// Ask the user to confirm a destructive action. `--yes` skips the
/// prompt; a non-interactive stdin without `--yes` is an error.
pub fn confirm(action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(action)
        .default(false)
        .interact()
        .map_err(|_| CliError::NonInteractiveRequiresYes {
            action: action.to_owned(),
        })
}

/// Parse a raw CLI value: integers and booleans become protocol numbers,
/// anything else is sent as text.
pub fn parse_action_value(raw: &str) -> ActionValue {
    if let Ok(n) = raw.parse::<i64>() {
        return ActionValue::Number(n);
    }
    match raw {
        "true" | "on" => ActionValue::from(true),
        "false" | "off" => ActionValue::from(false),
        _ => ActionValue::Text(raw.to_owned()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_value() {
        assert_eq!(parse_action_value("3"), ActionValue::Number(3));
        assert_eq!(parse_action_value("true"), ActionValue::Number(1));
        assert_eq!(parse_action_value("off"), ActionValue::Number(0));
        assert_eq!(
            parse_action_value("holiday"),
            ActionValue::Text("holiday".into())
        );
    }

    #[test]
    fn test_confirm_honors_yes_flag() {
        assert!(confirm("wipe it?", true).unwrap());
    }
}
