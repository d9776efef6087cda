mod lifecycle;
mod markup;
mod scheduler;
mod service;
