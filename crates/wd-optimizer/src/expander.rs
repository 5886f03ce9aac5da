//! Subrange initialization and growth.
//!
//! The searchable window of each ordered parameter starts at the median of
//! its domain and only widens toward the side where the incumbent best value
//! sits on the window's edge. Categorical parameters always span their full
//! set and never take part in growth.

use tracing::debug;
use wd_types::{Configuration, Domain, FullRange, ParameterValue, SearchError, SubRange, WdResult};

/// A single planned widening of one parameter's window.
enum Extension {
    Prepend(ParameterValue),
    Append(ParameterValue),
}

/// Initializes a fresh `subrange`, or widens it around `best`.
///
/// Returns whether anything was added. Initialization always counts as
/// growth. On error the subrange is left untouched.
pub fn expand(
    subrange: &mut SubRange,
    full_range: &FullRange,
    best: &Configuration,
) -> WdResult<bool> {
    if !subrange.is_initialized() {
        initialize(subrange, full_range);
        return Ok(true);
    }

    let plan = plan_growth(subrange, full_range, best)?;
    let extended = !plan.is_empty();

    for (param, extension) in plan {
        let window = subrange
            .get_mut(&param)
            .ok_or_else(|| SearchError::SubrangeMismatch { param: param.clone() })?;
        match extension {
            Extension::Prepend(value) => {
                debug!("Extending {} to the left with {}", param, value);
                window.insert(0, value);
            }
            Extension::Append(value) => {
                debug!("Extending {} to the right with {}", param, value);
                window.push(value);
            }
        }
    }

    Ok(extended)
}

/// Seeds every window: the whole set for categorical domains, the median
/// element and its right neighbour for ordered ones.
fn initialize(subrange: &mut SubRange, full_range: &FullRange) {
    for (param, domain) in full_range.iter() {
        let window = match domain {
            Domain::Unordered(values) => values.clone(),
            Domain::Ordered(values) => {
                let median = values.len().saturating_sub(1) / 2;
                values.iter().skip(median).take(2).cloned().collect()
            }
        };
        subrange.insert(param.clone(), window);
    }
    subrange.mark_initialized();
}

/// Left edge is checked before right; at most one extension per parameter.
fn plan_growth(
    subrange: &SubRange,
    full_range: &FullRange,
    best: &Configuration,
) -> WdResult<Vec<(String, Extension)>> {
    let mut plan = Vec::new();

    for (param, domain) in full_range.iter() {
        let Domain::Ordered(values) = domain else {
            continue;
        };

        let best_value = best
            .get(param)
            .ok_or_else(|| SearchError::Lookup { param: param.clone() })?;
        let window = subrange
            .get(param)
            .ok_or_else(|| SearchError::SubrangeMismatch { param: param.clone() })?;
        let index = domain
            .position(best_value)
            .ok_or_else(|| SearchError::ValueNotInDomain {
                param: param.clone(),
                value: best_value.to_string(),
            })?;

        let on_left_edge = window.first() == Some(best_value);
        let on_right_edge = window.last() == Some(best_value);

        if on_left_edge && index > 0 {
            plan.push((param.clone(), Extension::Prepend(values[index - 1].clone())));
        } else if on_right_edge && index + 1 < values.len() {
            plan.push((param.clone(), Extension::Append(values[index + 1].clone())));
        }
    }

    Ok(plan)
}
