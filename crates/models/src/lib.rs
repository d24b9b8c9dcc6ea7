pub mod db;
pub mod employee;

#[cfg(test)]
mod tests;
