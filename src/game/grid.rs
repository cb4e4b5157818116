use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::letters::{is_grid_letter, random_letter};

/// Default side length of a generated grid
pub const DEFAULT_GRID_SIZE: usize = 10;
/// Random trials spent on each word before giving up on the whole grid
pub const MAX_PLACEMENT_TRIALS: usize = 200;

/// A unit step between neighbouring cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub dr: isize,
    pub dc: isize,
}

/// The eight straight directions a word can run in
pub const DIRECTIONS: [Direction; 8] = [
    Direction { dr: 0, dc: 1 },
    Direction { dr: 1, dc: 0 },
    Direction { dr: 1, dc: 1 },
    Direction { dr: 1, dc: -1 },
    Direction { dr: 0, dc: -1 },
    Direction { dr: -1, dc: 0 },
    Direction { dr: -1, dc: -1 },
    Direction { dr: -1, dc: 1 },
];

/// A word laid along a straight line of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub word: String,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
}

impl Placement {
    /// Cells covered by the word, first letter first
    pub fn cells(&self) -> Vec<(usize, usize)> {
        let len = self.word.chars().count() as isize;
        (0..len)
            .map(|i| {
                (
                    (self.row as isize + i * self.direction.dr) as usize,
                    (self.col as isize + i * self.direction.dc) as usize,
                )
            })
            .collect()
    }
}

/// Raised when a word cannot be laid into the grid within the trial budget.
/// No partial grid survives a failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Could not place word '{word}'. Try fewer or shorter words.")]
pub struct PlacementFailure {
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridParseError {
    #[error("grid has {0} cells, which is not a square number")]
    NotSquare(usize),
    #[error("cell {index} holds {value:?}, expected a single letter A-Z")]
    InvalidCell { index: usize, value: String },
}

/// A completely filled square letter grid.
///
/// On the wire a grid is a flat row-major list of one-letter strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct Grid {
    size: usize,
    cells: Vec<char>,
}

impl Grid {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn letter_at(&self, row: usize, col: usize) -> Option<char> {
        if row < self.size && col < self.size {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    /// Row-major flat form used for storage and transport
    pub fn to_flat(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.to_string()).collect()
    }

    pub fn from_flat<S: AsRef<str>>(flat: &[S]) -> Result<Self, GridParseError> {
        let size = (flat.len() as f64).sqrt().round() as usize;
        if size * size != flat.len() {
            return Err(GridParseError::NotSquare(flat.len()));
        }

        let cells = flat
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let mut chars = cell.as_ref().chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) if is_grid_letter(letter) => Ok(letter),
                    _ => Err(GridParseError::InvalidCell {
                        index,
                        value: cell.as_ref().to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { size, cells })
    }

    /// Find the word along any straight line of the grid
    pub fn find_word(&self, word: &str) -> Option<Placement> {
        let letters: Vec<char> = word.to_uppercase().chars().collect();
        if letters.is_empty() {
            return None;
        }

        for row in 0..self.size {
            for col in 0..self.size {
                for direction in DIRECTIONS {
                    let matches = path(self.size, row, col, direction, letters.len())
                        .map(|cells| {
                            cells
                                .zip(&letters)
                                .all(|((r, c), letter)| self.letter_at(r, c) == Some(*letter))
                        })
                        .unwrap_or(false);

                    if matches {
                        return Some(Placement {
                            word: letters.iter().collect(),
                            row,
                            col,
                            direction,
                        });
                    }
                }
            }
        }

        None
    }
}

impl From<Grid> for Vec<String> {
    fn from(grid: Grid) -> Self {
        grid.to_flat()
    }
}

impl TryFrom<Vec<String>> for Grid {
    type Error = GridParseError;

    fn try_from(flat: Vec<String>) -> Result<Self, Self::Error> {
        Grid::from_flat(&flat)
    }
}

/// Cells of a straight path, or None when the far end leaves the grid
fn path(
    size: usize,
    row: usize,
    col: usize,
    direction: Direction,
    len: usize,
) -> Option<impl Iterator<Item = (usize, usize)>> {
    if len == 0 {
        return None;
    }
    let steps = len as isize - 1;
    let end_row = row as isize + steps * direction.dr;
    let end_col = col as isize + steps * direction.dc;
    let size = size as isize;
    if !(0..size).contains(&end_row) || !(0..size).contains(&end_col) {
        return None;
    }

    Some((0..len as isize).map(move |i| {
        (
            (row as isize + i * direction.dr) as usize,
            (col as isize + i * direction.dc) as usize,
        )
    }))
}

/// Grid under construction, blanks are None
struct Board {
    size: usize,
    cells: Vec<Option<char>>,
}

impl Board {
    fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Try to lay the word at the given start. Crossing letters must agree.
    fn try_place(&mut self, word: &[char], row: usize, col: usize, direction: Direction) -> bool {
        let Some(cells) = path(self.size, row, col, direction, word.len()) else {
            return false;
        };
        let cells: Vec<(usize, usize)> = cells.collect();

        let fits = cells.iter().zip(word).all(|(&(r, c), letter)| {
            match self.cells[r * self.size + c] {
                None => true,
                Some(existing) => existing == *letter,
            }
        });
        if !fits {
            return false;
        }

        for (&(r, c), letter) in cells.iter().zip(word) {
            self.cells[r * self.size + c] = Some(*letter);
        }
        true
    }

    fn fill<R: Rng + ?Sized>(self, rng: &mut R) -> Grid {
        let cells = self
            .cells
            .into_iter()
            .map(|cell| cell.unwrap_or_else(|| random_letter(rng)))
            .collect();
        Grid {
            size: self.size,
            cells,
        }
    }
}

/// Lays a word list into a square grid.
///
/// Greedy longest-first with a bounded number of random trials per word.
/// This is a heuristic; it may fail even when a layout exists.
#[derive(Debug, Clone)]
pub struct GridGenerator {
    size: usize,
    max_trials: usize,
}

impl Default for GridGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE, MAX_PLACEMENT_TRIALS)
    }
}

impl GridGenerator {
    pub fn new(size: usize, max_trials: usize) -> Self {
        Self { size, max_trials }
    }

    /// Generate a filled grid holding every word, or report the first word that
    /// could not be placed
    pub fn generate<S, R>(&self, words: &[S], rng: &mut R) -> Result<Grid, PlacementFailure>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let mut board = Board::new(self.size);

        for word in placement_order(words) {
            if !self.place_word(&mut board, &word, rng) {
                let word: String = word.into_iter().collect();
                tracing::debug!(word = %word, size = self.size, "Word placement failed");
                return Err(PlacementFailure { word });
            }
        }

        let grid = board.fill(rng);
        debug_assert!(words.iter().all(|w| {
            grid.find_word(w.as_ref()).is_some_and(|p| {
                p.cells()
                    .iter()
                    .all(|&(r, c)| r < self.size && c < self.size)
            })
        }));
        Ok(grid)
    }

    fn place_word<R: Rng + ?Sized>(&self, board: &mut Board, word: &[char], rng: &mut R) -> bool {
        // No trial can succeed for these, fail without burning the budget
        if word.is_empty()
            || word.len() > self.size
            || !word.iter().copied().all(is_grid_letter)
        {
            return false;
        }

        for _ in 0..self.max_trials {
            let direction = DIRECTIONS[rng.random_range(0..DIRECTIONS.len())];
            let row = rng.random_range(0..self.size);
            let col = rng.random_range(0..self.size);

            if board.try_place(word, row, col, direction) {
                return true;
            }
        }

        false
    }
}

/// Uppercased words, longest first. Equal lengths keep their input order.
fn placement_order<S: AsRef<str>>(words: &[S]) -> Vec<Vec<char>> {
    let mut ordered: Vec<Vec<char>> = words
        .iter()
        .map(|w| w.as_ref().to_uppercase().chars().collect())
        .collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn generate(words: &[&str], size: usize, seed: u64) -> Result<Grid, PlacementFailure> {
        let mut rng = StdRng::seed_from_u64(seed);
        GridGenerator::new(size, MAX_PLACEMENT_TRIALS).generate(words, &mut rng)
    }

    #[test]
    fn test_cat_and_dog_in_ten_by_ten() {
        let grid = generate(&["CAT", "DOG"], 10, 1).unwrap();

        let flat = grid.to_flat();
        assert_eq!(flat.len(), 100);
        assert!(flat
            .iter()
            .all(|cell| cell.len() == 1 && cell.chars().all(|c| c.is_ascii_uppercase())));

        for word in ["CAT", "DOG"] {
            let placement = grid.find_word(word).expect("word should be in grid");
            let letters: String = placement
                .cells()
                .into_iter()
                .map(|(r, c)| grid.letter_at(r, c).unwrap())
                .collect();
            assert_eq!(letters, word);
        }
    }

    #[test]
    fn test_word_longer_than_grid_always_fails() {
        let long = "A".repeat(11);
        for seed in 0..20 {
            let err = generate(&[long.as_str()], 10, seed).unwrap_err();
            assert_eq!(err.word, long);
        }
    }

    #[test]
    fn test_failure_names_the_unplaceable_word() {
        // A 1x1 grid fits exactly one letter
        let err = generate(&["A", "B"], 1, 3).unwrap_err();
        assert_eq!(err, PlacementFailure { word: "B".to_string() });
    }

    #[test]
    fn test_every_word_present_and_no_blanks() {
        let words = ["PYTHON", "RUST", "TOKIO", "AXUM", "SERDE", "GRID", "WORD"];
        for seed in 0..50 {
            match generate(&words, 10, seed) {
                Ok(grid) => {
                    assert_eq!(grid.size(), 10);
                    assert_eq!(grid.to_flat().len(), 100);
                    assert!(grid.to_flat().iter().all(|c| c.chars().count() == 1));
                    for word in words {
                        assert!(grid.find_word(word).is_some(), "{} missing (seed {})", word, seed);
                    }
                }
                Err(PlacementFailure { word }) => {
                    assert!(words.contains(&word.as_str()));
                }
            }
        }
    }

    #[test]
    fn test_words_with_non_letters_are_never_placed() {
        for word in ["R2D2", "ICE CREAM", "CAFÉ", "A-B"] {
            let err = generate(&["CAT", word], 10, 11).unwrap_err();
            assert_eq!(err.word, word);
        }
    }

    #[test]
    fn test_generated_grid_parses_back() {
        for seed in 0..20 {
            let grid = generate(&["strasse", "Zebra"], 10, seed).unwrap();
            assert_eq!(Grid::from_flat(&grid.to_flat()), Ok(grid));
        }
    }

    #[test]
    fn test_lowercase_words_are_uppercased() {
        let grid = generate(&["cat"], 5, 9).unwrap();
        let placement = grid.find_word("CAT").unwrap();
        assert_eq!(placement.word, "CAT");
    }

    #[test]
    fn test_same_seed_same_grid() {
        let a = generate(&["APPLE", "PEAR", "PLUM"], 8, 1234).unwrap();
        let b = generate(&["APPLE", "PEAR", "PLUM"], 8, 1234).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_full_length_word_stays_in_bounds() {
        for seed in 0..20 {
            let grid = generate(&["ABCDE"], 5, seed).unwrap();
            let placement = grid.find_word("ABCDE").unwrap();
            let cells = placement.cells();
            assert!(cells.iter().all(|&(r, c)| r < 5 && c < 5));

            let (start, end) = (cells[0], cells[4]);
            let on_edge = |(r, c): (usize, usize)| r == 0 || r == 4 || c == 0 || c == 4;
            assert!(on_edge(start) && on_edge(end));
        }
    }

    #[test]
    fn test_crossing_words_must_agree() {
        let mut board = Board::new(5);
        let right = DIRECTIONS[0];
        let down = DIRECTIONS[1];

        assert!(board.try_place(&['C', 'A', 'T'], 0, 0, right));
        // Shares the C at (0, 0)
        assert!(board.try_place(&['C', 'A', 'R'], 0, 0, down));
        // Would overwrite that C with a D
        assert!(!board.try_place(&['D', 'O', 'G'], 0, 0, down));
        assert_eq!(board.cells[0], Some('C'));
        assert_eq!(board.cells[5], Some('A'));
    }

    #[test]
    fn test_out_of_bounds_start_is_rejected() {
        let mut board = Board::new(3);
        let left = DIRECTIONS[4];
        assert!(!board.try_place(&['A', 'B', 'C'], 0, 1, left));
        assert!(board.cells.iter().all(|c| c.is_none()));
    }

    #[test]
    fn test_longest_words_first_with_stable_ties() {
        let order = placement_order(&["ab", "cde", "fg", "hijk"]);
        let order: Vec<String> = order.into_iter().map(|w| w.into_iter().collect()).collect();
        assert_eq!(order, vec!["HIJK", "CDE", "AB", "FG"]);
    }

    #[test]
    fn test_flat_form_round_trips() {
        let grid = generate(&["HELLO", "WORLD"], 10, 77).unwrap();
        let flat = grid.to_flat();
        let parsed = Grid::from_flat(&flat).unwrap();
        assert_eq!(parsed, grid);
        assert_eq!(parsed.to_flat(), flat);

        let json = serde_json::to_string(&grid).unwrap();
        let decoded: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, grid);
    }

    #[test]
    fn test_from_flat_rejects_bad_input() {
        assert_eq!(
            Grid::from_flat(&["A", "B", "C"]),
            Err(GridParseError::NotSquare(3))
        );
        assert!(matches!(
            Grid::from_flat(&["A", "BC", "D", "E"]),
            Err(GridParseError::InvalidCell { index: 1, .. })
        ));
        for bad in ["2", " ", "a", "É"] {
            assert!(matches!(
                Grid::from_flat(&["A", bad, "C", "D"]),
                Err(GridParseError::InvalidCell { index: 1, .. })
            ));
        }
    }

    #[test]
    fn test_empty_word_list_gives_random_grid() {
        let grid = generate(&[], 4, 5).unwrap();
        assert_eq!(grid.size(), 4);
        assert_eq!(grid.to_flat().len(), 16);
    }
}
