use super::{json_pretty, or_dash, EXIT_SUCCESS};
use crate::client::{CarpoolClient, ClientError};
use carpool_schema::{User, UserProfile};
use clap::Args;

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, default_value = "")]
    mobile: String,
    #[arg(long, default_value = "")]
    email: String,
    /// Register the user as a car owner (requires --license and --plate).
    #[arg(long, default_value_t = false)]
    car_owner: bool,
    /// Driver license number.
    #[arg(long)]
    license: Option<String>,
    /// Car plate number.
    #[arg(long)]
    plate: Option<String>,
}

impl From<ProfileArgs> for UserProfile {
    fn from(args: ProfileArgs) -> Self {
        UserProfile {
            first_name: args.first_name,
            last_name: args.last_name,
            mobile_number: args.mobile,
            email: args.email,
            is_car_owner: args.car_owner,
            driver_license: args.license,
            car_plate_number: args.plate,
        }
    }
}

fn print_user(user: &User) {
    println!("id:          {}", user.id);
    println!("name:        {} {}", user.first_name, user.last_name);
    println!("mobile:      {}", or_dash(Some(user.mobile_number.as_str())));
    println!("email:       {}", or_dash(Some(user.email.as_str())));
    println!(
        "car owner:   {}",
        if user.is_eligible_car_owner() { "yes" } else { "no" }
    );
    println!("license:     {}", or_dash(user.driver_license.as_deref()));
    println!("plate:       {}", or_dash(user.car_plate_number.as_deref()));
    println!("created_at:  {}", user.created_at.to_rfc3339());
}

fn print_result(user: &User, verb: &str, json: bool) -> Result<u8, ClientError> {
    if json {
        println!("{}", json_pretty(user)?);
    } else {
        println!("{verb} user {}", user.id);
    }
    Ok(EXIT_SUCCESS)
}

pub fn list(client: &CarpoolClient, json: bool) -> Result<u8, ClientError> {
    let users = client.list_users()?;
    if json {
        println!("{}", json_pretty(&users)?);
    } else if users.is_empty() {
        println!("no users found");
    } else {
        println!("{:<16} {:<24} {:<6} CREATED", "ID", "NAME", "OWNER");
        for user in &users {
            let name = format!("{} {}", user.first_name, user.last_name);
            println!(
                "{:<16} {:<24} {:<6} {}",
                user.id,
                name.trim(),
                if user.is_eligible_car_owner() { "yes" } else { "no" },
                user.created_at.format("%Y-%m-%d")
            );
        }
    }
    Ok(EXIT_SUCCESS)
}

pub fn show(client: &CarpoolClient, user_id: &str, json: bool) -> Result<u8, ClientError> {
    let user = client.get_user(user_id)?;
    if json {
        println!("{}", json_pretty(&user)?);
    } else {
        print_user(&user);
    }
    Ok(EXIT_SUCCESS)
}

pub fn create(
    client: &CarpoolClient,
    user_id: &str,
    profile: ProfileArgs,
    json: bool,
) -> Result<u8, ClientError> {
    let user = client.register_user(user_id, &profile.into())?;
    print_result(&user, "registered", json)
}

pub fn update(
    client: &CarpoolClient,
    user_id: &str,
    profile: ProfileArgs,
    json: bool,
) -> Result<u8, ClientError> {
    let user = client.update_user(user_id, &profile.into())?;
    print_result(&user, "updated", json)
}

pub fn delete(client: &CarpoolClient, user_id: &str, json: bool) -> Result<u8, ClientError> {
    let user = client.delete_user(user_id)?;
    print_result(&user, "deleted", json)
}
