pub mod connect_prompt;
pub mod gif_grid;
pub mod portal;
pub mod sign_in;
pub mod toaster;
