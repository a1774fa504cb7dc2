/// Map layer: coordinates for the current view.
///
/// ```text
///   View + headers
///        │
///        ▼
///   ┌──────────┐   lat/lon columns   ┌──────┐
///   │ columns  │ ──────────────────▶ │ pins │
///   └──────────┘                     └──────┘
///        │ place column                 ▲
///        ▼                              │
///   ┌──────────┐  650 ms apart  ┌───────────────┐
///   │ resolver │ ─────────────▶ │ GeocodeCache  │
///   └──────────┘   (≤ 40)       └───────────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ nominatim │  HTTP lookup
///   └───────────┘
/// ```

pub mod columns;
pub mod map;
pub mod nominatim;
pub mod resolver;
