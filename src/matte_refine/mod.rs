pub mod alpha_hardener;
pub mod codec;
pub mod composite;
pub mod decontaminate;
pub mod feather;
pub mod inpaint;
pub mod mask_normalizer;
pub mod model;
mod morphology;
pub mod pipeline;
pub mod profile;
pub mod tone;
pub mod trimap;
