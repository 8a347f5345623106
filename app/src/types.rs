//! Domain types for the booking backend.
//!
//! Identifiers, money, seat labels, the hall layout, and the movie and
//! booking entities. Entities serialize with camelCase field names, which is
//! the shape the HTTP API returns.

use chrono::{DateTime, Utc};
use marquee_auth::UserId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a movie
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(Uuid);

impl MovieId {
    /// Creates a new random `MovieId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `MovieId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MovieId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// A non-negative amount in cents.
///
/// On the wire it is a decimal number of currency units (`12.5` is 1250
/// cents); internally it is always whole cents, so comparisons are exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Parse a decimal unit amount.
    ///
    /// `None` for negative, non-finite, or sub-cent values.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_units(units: f64) -> Option<Self> {
        if !units.is_finite() || units < 0.0 {
            return None;
        }
        let cents = (units * 100.0).round();
        if cents > 9_007_199_254_740_992.0 || (cents - units * 100.0).abs() > 1e-6 {
            return None;
        }
        Some(Self(cents as u64))
    }

    /// The amount as decimal units
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies by a quantity with overflow checking
    #[must_use]
    pub const fn checked_mul(self, quantity: u64) -> Option<Self> {
        match self.0.checked_mul(quantity) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_units())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let units = f64::deserialize(deserializer)?;
        Self::from_units(units).ok_or_else(|| {
            serde::de::Error::custom("amount must be a non-negative number with at most two decimals")
        })
    }
}

// ============================================================================
// Seats
// ============================================================================

/// Why a seat label was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatLabelError {
    /// Not a row letter followed by a column number
    #[error("invalid seat label '{0}': expected a row letter A-Z followed by a number 1-99")]
    Malformed(String),

    /// Well-formed, but the hall has no such seat
    #[error("seat {seat} is outside the hall ({rows} rows x {columns} columns)")]
    OutsideHall {
        /// The seat
        seat: SeatLabel,
        /// Hall rows
        rows: u8,
        /// Hall columns
        columns: u8,
    },
}

/// A seat such as `C4`: row letter `A`-`Z`, column `1`-`99`.
///
/// Ordered by row, then column, so `A2 < A10 < B1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeatLabel {
    row: u8,
    column: u8,
}

impl SeatLabel {
    /// Build from a zero-based row index and a one-based column.
    #[must_use]
    pub fn new(row: u8, column: u8) -> Option<Self> {
        (row < 26 && (1..=99).contains(&column)).then_some(Self { row, column })
    }

    /// Zero-based row index (`A` is 0)
    #[must_use]
    pub const fn row(&self) -> u8 {
        self.row
    }

    /// One-based column number
    #[must_use]
    pub const fn column(&self) -> u8 {
        self.column
    }

    /// Row letter
    #[must_use]
    pub const fn row_letter(&self) -> char {
        (b'A' + self.row) as char
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column)
    }
}

impl FromStr for SeatLabel {
    type Err = SeatLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SeatLabelError::Malformed(s.to_string());
        let label = s.trim().to_ascii_uppercase();

        let mut chars = label.chars();
        let row = chars.next().filter(char::is_ascii_uppercase).ok_or_else(malformed)?;
        let digits = chars.as_str();
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let column: u8 = digits.parse().map_err(|_| malformed())?;

        #[allow(clippy::cast_possible_truncation)]
        let row = (row as u32 - 'A' as u32) as u8;
        Self::new(row, column).ok_or_else(malformed)
    }
}

impl Serialize for SeatLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeatLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Seat grid of one hall: rows `A..` and columns `1..=columns`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HallLayout {
    rows: u8,
    columns: u8,
}

impl HallLayout {
    /// Largest layout a seat label can address
    pub const MAX: Self = Self { rows: 26, columns: 99 };

    /// Build a layout, clamping to `1..=26` rows and `1..=99` columns.
    #[must_use]
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            rows: rows.clamp(1, 26),
            columns: columns.clamp(1, 99),
        }
    }

    /// Row count
    #[must_use]
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    /// Column count
    #[must_use]
    pub const fn columns(&self) -> u8 {
        self.columns
    }

    /// Whether the seat exists in this hall
    #[must_use]
    pub const fn contains(&self, seat: SeatLabel) -> bool {
        seat.row < self.rows && seat.column <= self.columns
    }

    /// Parse a label and check it lies inside the hall.
    ///
    /// # Errors
    ///
    /// [`SeatLabelError`] for malformed labels or seats outside the layout.
    pub fn parse_seat(&self, raw: &str) -> Result<SeatLabel, SeatLabelError> {
        let seat: SeatLabel = raw.parse()?;
        if self.contains(seat) {
            Ok(seat)
        } else {
            Err(SeatLabelError::OutsideHall {
                seat,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }
}

impl Default for HallLayout {
    fn default() -> Self {
        Self { rows: 10, columns: 10 }
    }
}

// ============================================================================
// Movies
// ============================================================================

/// A movie in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Movie ID
    pub id: MovieId,
    /// Title (non-blank)
    pub title: String,
    /// Release year
    pub year: Option<i32>,
    /// Poster URL or upload path
    pub poster: Option<String>,
    /// Synopsis
    pub description: Option<String>,
    /// Showtime labels, in display order
    pub showtimes: Vec<String>,
    /// Price of one ticket
    pub ticket_price: Money,
    /// Rating, 0 to 10
    pub rating: Option<f64>,
    /// Running time in minutes
    #[serde(rename = "length")]
    pub length_minutes: Option<u32>,
    /// Admin who created it
    pub created_by: Option<UserId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    /// Whether `showtime` is one of this movie's labels
    #[must_use]
    pub fn has_showtime(&self, showtime: &str) -> bool {
        self.showtimes.iter().any(|s| s == showtime)
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created, awaiting payment
    Pending,
    /// Payment confirmed (terminal)
    Paid,
}

impl BookingStatus {
    /// Storage and metrics label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

/// A persisted booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Owner
    pub user_id: UserId,
    /// Movie (may since have been deleted)
    pub movie_id: MovieId,
    /// Showtime label at booking time
    pub showtime: String,
    /// Seats, sorted and distinct
    pub seats: Vec<SeatLabel>,
    /// Price per seat at booking time
    pub ticket_price: Money,
    /// `ticket_price` x seat count
    pub total_price: Money,
    /// Status
    pub status: BookingStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// A booking with its movie embedded; `movie` is `None` once the movie is deleted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookingDetails {
    /// The booking
    #[serde(flatten)]
    pub booking: Booking,
    /// The movie, if it still exists
    pub movie: Option<Movie>,
}

/// The priced seat selection produced when a user proceeds from seat
/// selection. Not persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    /// Movie
    pub movie_id: MovieId,
    /// Showtime label
    pub showtime: String,
    /// Seats, sorted
    pub seats: Vec<SeatLabel>,
    /// Price per seat
    pub ticket_price: Money,
    /// Total
    pub total_price: Money,
}
