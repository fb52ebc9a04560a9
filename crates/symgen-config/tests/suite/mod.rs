mod discovery;
mod loading;
mod logging;
