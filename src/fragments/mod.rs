mod attachment;
mod demo;
mod library;
mod load;
mod model;
mod parse;

pub use attachment::{decode_data_url, load_image};
pub use library::{LIBRARY, random_diverse, random_mix};
pub use load::load_fragments;
pub use model::{
    Connection, ConnectionType, Fragment, FragmentImage, FragmentInput, FragmentSummary, Ghost,
    GraphData, ImageReading, SecondaryAnalysis, Theme,
};
pub use parse::{ParseError, parse_graph_data, parse_image_reading, parse_secondary};

#[cfg(test)]
pub(crate) use attachment::sample_png;
