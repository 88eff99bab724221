#[cfg(test)]
mod unit;
