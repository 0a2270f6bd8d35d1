//! U.S. State Codes
//! The fixed enumeration of location codes a heat map can color.

/// Value substituted for a missing location code.
pub const UNKNOWN_SENTINEL: &str = "UNKN";

/// USPS codes for the 50 states plus DC, alphabetical by code.
pub const STATES: [(&str, &str); 51] = [
    ("AK", "Alaska"),
    ("AL", "Alabama"),
    ("AR", "Arkansas"),
    ("AZ", "Arizona"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("IA", "Iowa"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("ME", "Maine"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("MS", "Mississippi"),
    ("MT", "Montana"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("NE", "Nebraska"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NV", "Nevada"),
    ("NY", "New York"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VA", "Virginia"),
    ("VT", "Vermont"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("WV", "West Virginia"),
    ("WY", "Wyoming"),
];

/// Tile-grid position (column, row) of every code on a 12x8 grid.
pub const TILE_GRID: [(&str, u32, u32); 51] = [
    ("AK", 0, 0),
    ("ME", 11, 0),
    ("WI", 6, 1),
    ("VT", 10, 1),
    ("NH", 11, 1),
    ("WA", 1, 2),
    ("ID", 2, 2),
    ("MT", 3, 2),
    ("ND", 4, 2),
    ("MN", 5, 2),
    ("IL", 6, 2),
    ("MI", 7, 2),
    ("NY", 9, 2),
    ("MA", 10, 2),
    ("OR", 1, 3),
    ("NV", 2, 3),
    ("WY", 3, 3),
    ("SD", 4, 3),
    ("IA", 5, 3),
    ("IN", 6, 3),
    ("OH", 7, 3),
    ("PA", 8, 3),
    ("NJ", 9, 3),
    ("CT", 10, 3),
    ("RI", 11, 3),
    ("CA", 1, 4),
    ("UT", 2, 4),
    ("CO", 3, 4),
    ("NE", 4, 4),
    ("MO", 5, 4),
    ("KY", 6, 4),
    ("WV", 7, 4),
    ("VA", 8, 4),
    ("MD", 9, 4),
    ("DE", 10, 4),
    ("AZ", 2, 5),
    ("NM", 3, 5),
    ("KS", 4, 5),
    ("AR", 5, 5),
    ("TN", 6, 5),
    ("NC", 7, 5),
    ("SC", 8, 5),
    ("DC", 9, 5),
    ("OK", 4, 6),
    ("LA", 5, 6),
    ("MS", 6, 6),
    ("AL", 7, 6),
    ("GA", 8, 6),
    ("HI", 0, 7),
    ("TX", 4, 7),
    ("FL", 9, 7),
];

pub const GRID_COLUMNS: u32 = 12;
pub const GRID_ROWS: u32 = 8;

/// Check whether a normalized code is one of the mappable codes.
pub fn is_valid_code(code: &str) -> bool {
    STATES.binary_search_by(|(c, _)| (*c).cmp(code)).is_ok()
}

/// Full name for a code, if it is mappable.
pub fn state_name(code: &str) -> Option<&'static str> {
    STATES
        .binary_search_by(|(c, _)| (*c).cmp(code))
        .ok()
        .map(|idx| STATES[idx].1)
}

/// All mappable codes in alphabetical order.
pub fn all_codes() -> impl Iterator<Item = &'static str> {
    STATES.iter().map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn states_are_sorted_for_binary_search() {
        let codes: Vec<&str> = all_codes().collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn validity_lookup() {
        assert!(is_valid_code("CA"));
        assert!(is_valid_code("DC"));
        assert!(!is_valid_code("PR"));
        assert!(!is_valid_code("ca"));
        assert!(!is_valid_code(UNKNOWN_SENTINEL));
        assert_eq!(state_name("NY"), Some("New York"));
        assert_eq!(state_name("HHS"), None);
    }

    #[test]
    fn tile_grid_covers_every_code_once() {
        let grid_codes: HashSet<&str> = TILE_GRID.iter().map(|(c, _, _)| *c).collect();
        let state_codes: HashSet<&str> = all_codes().collect();
        assert_eq!(grid_codes, state_codes);

        let cells: HashSet<(u32, u32)> = TILE_GRID.iter().map(|(_, x, y)| (*x, *y)).collect();
        assert_eq!(cells.len(), TILE_GRID.len());
        assert!(TILE_GRID
            .iter()
            .all(|(_, x, y)| *x < GRID_COLUMNS && *y < GRID_ROWS));
    }
}
