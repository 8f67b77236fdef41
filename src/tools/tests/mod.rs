#[cfg(test)]
mod audio_tests;
#[cfg(test)]
mod dependencies_tests;
#[cfg(test)]
mod wifi_tests;
