//! User selection handling.
//! Generation commands let the user pick entities, scripts, templates and presets. The
//! choice itself sits behind [`Selector`] so flows can run interactively (dialoguer) or
//! unattended.

use crate::error::{Error, Result};
use dialoguer::MultiSelect;

/// Picks a subset of labelled items.
pub trait Selector {
    /// Returns the indices of the chosen items.
    ///
    /// # Errors
    /// * `Error::SelectionCancelled` if the user aborts the prompt
    fn select_many(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>>;
}

/// Interactive multi-select prompt in the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerSelector;

impl DialoguerSelector {
    pub fn new() -> Self {
        Self
    }
}

impl Selector for DialoguerSelector {
    fn select_many(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        MultiSelect::new()
            .with_prompt(prompt)
            .items(items)
            .interact_opt()
            .map_err(|e| Error::SelectionCancelled(e.to_string()))?
            .ok_or_else(|| Error::SelectionCancelled(prompt.to_string()))
    }
}

/// Non-interactive selector choosing every item.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Selector for AcceptAll {
    fn select_many(&self, _prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        Ok((0..items.len()).collect())
    }
}

/// Lets the user choose among `items`; an empty choice counts as cancelled.
///
/// # Arguments
/// * `selector` - Selection backend
/// * `prompt` - Prompt text
/// * `items` - Candidates
/// * `label` - Display label of a candidate
pub fn choose<T, F>(selector: &dyn Selector, prompt: &str, items: Vec<T>, label: F) -> Result<Vec<T>>
where
    F: Fn(&T) -> String,
{
    if items.is_empty() {
        return Err(Error::SelectionCancelled(format!("{prompt}: nothing to choose from")));
    }

    let labels: Vec<String> = items.iter().map(&label).collect();
    let picked = selector.select_many(prompt, &labels)?;
    if picked.is_empty() {
        return Err(Error::SelectionCancelled(format!("{prompt}: nothing selected")));
    }

    Ok(items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| picked.contains(i))
        .map(|(_, item)| item)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PickSecond;

    impl Selector for PickSecond {
        fn select_many(&self, _prompt: &str, items: &[String]) -> Result<Vec<usize>> {
            Ok(if items.len() > 1 { vec![1] } else { Vec::new() })
        }
    }

    #[test]
    fn test_choose_keeps_picked_items() {
        let picked = choose(&PickSecond, "Pick", vec!["a", "b", "c"], |s| s.to_string()).unwrap();
        assert_eq!(picked, vec!["b"]);
    }

    #[test]
    fn test_empty_choice_is_cancelled() {
        let result = choose(&PickSecond, "Pick", vec!["only"], |s| s.to_string());
        assert!(matches!(result, Err(Error::SelectionCancelled(_))));

        let result = choose(&AcceptAll, "Pick", Vec::<&str>::new(), |s| s.to_string());
        assert!(matches!(result, Err(Error::SelectionCancelled(_))));
    }
}
