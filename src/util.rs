const MANAGER_URL: &str = "WING_MANAGER_URL";

pub fn get_manager_url() -> Option<String> {
    std::env::var(MANAGER_URL).ok().filter(|url| !url.is_empty())
}

const MANAGER_TOKEN: &str = "WING_MANAGER_TOKEN";

pub fn get_manager_token() -> Option<String> {
    let token_from_env = std::env::var(MANAGER_TOKEN);
    token_from_env.ok()
}
