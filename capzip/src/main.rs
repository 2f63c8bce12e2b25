mod application;
mod presentation;

use capzip_core::error::Result;

fn main() -> Result<()> {
    application::run()
}
