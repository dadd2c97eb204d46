pub mod add;
pub mod answer;
pub mod decks;
pub mod due;
pub mod entries;
pub mod quiz;
pub mod review;
pub mod search;
pub mod show;
pub mod stats;
pub mod wallpaper;
pub mod wrong;
