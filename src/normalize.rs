//! Symptom normalization shared by training and serving.
//!
//! Every symptom string that enters the system, whether read from a dataset
//! cell or typed by a user, goes through [`normalize_symptom`]. The rules are
//! versioned by [`NORMALIZATION_VERSION`], which is stored in every model
//! artifact; a service refuses an artifact built under different rules.

/// Version of the normalization rules. Bump whenever the output of
/// [`normalize_symptom`] changes for any input.
pub const NORMALIZATION_VERSION: u32 = 1;

/// Separators that join several symptoms inside one raw dataset cell.
pub const COMPOUND_SEPARATORS: &[char] = &[',', ';', '|'];

/// Canonical joiner between the words of one symptom.
pub const WORD_JOINER: char = '_';

/// Normalizes one symptom string into its token form.
///
/// Trims, lowercases, collapses every run of whitespace and/or underscores
/// into a single `_`, and drops leading and trailing separators. Returns
/// `None` when nothing is left.
///
/// # Examples
///
/// ```
/// use medpredict::normalize::normalize_symptom;
///
/// assert_eq!(normalize_symptom("  Skin Rash ").as_deref(), Some("skin_rash"));
/// assert_eq!(normalize_symptom("skin__rash").as_deref(), Some("skin_rash"));
/// assert_eq!(normalize_symptom(" _ "), None);
/// ```
#[must_use]
pub fn normalize_symptom(raw: &str) -> Option<String> {
    let mut token = String::with_capacity(raw.len());
    let mut pending_joiner = false;

    for ch in raw.chars() {
        if ch.is_whitespace() || ch == WORD_JOINER {
            pending_joiner = true;
            continue;
        }
        if pending_joiner && !token.is_empty() {
            token.push(WORD_JOINER);
        }
        pending_joiner = false;
        token.extend(ch.to_lowercase());
    }

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Splits a raw dataset cell on [`COMPOUND_SEPARATORS`] and normalizes each
/// part, dropping parts that normalize to nothing.
///
/// # Examples
///
/// ```
/// use medpredict::normalize::split_compound;
///
/// assert_eq!(
///     split_compound("Itching; skin_rash, nodal skin eruptions"),
///     vec!["itching", "skin_rash", "nodal_skin_eruptions"],
/// );
/// ```
#[must_use]
pub fn split_compound(cell: &str) -> Vec<String> {
    cell.split(COMPOUND_SEPARATORS)
        .filter_map(normalize_symptom)
        .collect()
}

/// Human-readable form of a token: `_` becomes a space and every word is
/// capitalized.
///
/// # Examples
///
/// ```
/// use medpredict::normalize::readable;
///
/// assert_eq!(readable("nodal_skin_eruptions"), "Nodal Skin Eruptions");
/// ```
#[must_use]
pub fn readable(token: &str) -> String {
    token
        .split(WORD_JOINER)
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
